// src/ipc.rs

//! Control socket: one command per line from `execbar refresh|click`.
//!
//! ```text
//! refresh <name>
//! click <name> <button> [panel]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cli::ClientCommand;
use crate::engine::ControlEvent;
use crate::exec::Pointer;
use crate::types::MouseButton;

/// `$XDG_RUNTIME_DIR/execbar.sock`, or `/tmp/execbar.sock`.
pub fn default_socket_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join("execbar.sock")
}

/// Turn one request line into a control event.
pub fn parse_command(line: &str) -> std::result::Result<ControlEvent, String> {
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (Some("refresh"), Some(name)) if words.next().is_none() => Ok(ControlEvent::ForceUpdate {
            name: name.to_string(),
        }),
        (Some("click"), Some(name)) => {
            let button: MouseButton = words
                .next()
                .ok_or_else(|| "click needs a button".to_string())?
                .parse()?;
            let panel = match words.next() {
                Some(p) => p.parse().map_err(|_| format!("invalid panel index: {p}"))?,
                None => 0,
            };
            if words.next().is_some() {
                return Err("too many arguments to click".to_string());
            }
            Ok(ControlEvent::Click {
                name: name.to_string(),
                panel,
                button,
                pointer: Pointer::default(),
            })
        }
        _ => Err(format!("unknown command: {:?}", line.trim())),
    }
}

/// Line sent for a CLI client command.
pub fn format_command(cmd: &ClientCommand) -> String {
    match cmd {
        ClientCommand::Refresh { name } => format!("refresh {name}"),
        ClientCommand::Click {
            name,
            button,
            panel,
        } => format!("click {name} {} {panel}", button.number()),
    }
}

/// Bind the control socket and forward parsed requests to `tx`.
///
/// A stale socket file from a previous instance is replaced.
pub fn spawn_listener(path: &Path, tx: mpsc::Sender<ControlEvent>) -> Result<JoinHandle<()>> {
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)
        .with_context(|| format!("binding control socket {}", path.display()))?;
    info!(socket = %path.display(), "control socket listening");

    Ok(tokio::spawn(async move {
        loop {
            let stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!(error = %e, "control socket accept failed");
                    continue;
                }
            };
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(event) => {
                        debug!(?event, "control request");
                        if tx.send(event).await.is_err() {
                            debug!("runtime gone; control socket closing");
                            return;
                        }
                    }
                    Err(e) => warn!(request = %line.trim(), error = %e, "ignoring control request"),
                }
            }
        }
    }))
}

/// Send one command to a running instance.
pub async fn send_command(path: &Path, cmd: &ClientCommand) -> Result<()> {
    let mut stream = UnixStream::connect(path)
        .await
        .with_context(|| format!("execbar not running? could not connect to {}", path.display()))?;
    let line = format_command(cmd);
    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_lines_name_one_executor() {
        match parse_command("refresh clock\n").unwrap() {
            ControlEvent::ForceUpdate { name } => assert_eq!(name, "clock"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_command("refresh").is_err());
        assert!(parse_command("refresh a b").is_err());
    }

    #[test]
    fn click_lines_take_button_and_optional_panel() {
        match parse_command("click vol 4 2").unwrap() {
            ControlEvent::Click {
                name,
                panel,
                button,
                ..
            } => {
                assert_eq!(name, "vol");
                assert_eq!(panel, 2);
                assert_eq!(button, MouseButton::WheelUp);
            }
            other => panic!("unexpected {other:?}"),
        }
        match parse_command("click vol left").unwrap() {
            ControlEvent::Click { panel, button, .. } => {
                assert_eq!(panel, 0);
                assert_eq!(button, MouseButton::Left);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_command("click vol 9").is_err());
        assert!(parse_command("click vol").is_err());
        assert!(parse_command("reload").is_err());
    }

    #[test]
    fn client_commands_format_to_parseable_lines() {
        let cmd = ClientCommand::Click {
            name: "vol".into(),
            button: MouseButton::Right,
            panel: 1,
        };
        assert_eq!(format_command(&cmd), "click vol 3 1");
        assert!(parse_command(&format_command(&cmd)).is_ok());
    }

    #[tokio::test]
    async fn requests_over_the_socket_reach_the_runtime_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctl.sock");
        let (tx, mut rx) = mpsc::channel(4);
        let handle = spawn_listener(&path, tx).unwrap();

        send_command(&path, &ClientCommand::Refresh { name: "clock".into() })
            .await
            .unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, ControlEvent::ForceUpdate { name } if name == "clock"));
        handle.abort();
    }
}
