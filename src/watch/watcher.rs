// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::load_and_validate;
use crate::engine::ControlEvent;

/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Does `event` touch the config file?
pub fn affects_config(event: &Event, config_path: &Path) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    );
    let Some(file_name) = config_path.file_name() else {
        return false;
    };
    relevant && event.paths.iter().any(|p| p.file_name() == Some(file_name))
}

/// Watch `config_path` and post `ControlEvent::Reload` with the newly
/// validated config whenever it changes. Invalid edits are logged and the
/// running configuration stays in place.
pub fn spawn_config_watcher(
    config_path: impl Into<PathBuf>,
    runtime_tx: mpsc::Sender<ControlEvent>,
) -> Result<WatcherHandle> {
    let config_path = config_path.into();
    let config_path = config_path.canonicalize().unwrap_or(config_path);
    let dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("execbar: failed to forward notify event: {err}");
                }
            }
            Err(err) => eprintln!("execbar: config watch error: {err}"),
        },
        Config::default(),
    )?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    info!(config = %config_path.display(), "watching config for changes");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !affects_config(&event, &config_path) {
                continue;
            }
            debug!(kind = ?event.kind, "config file changed");
            // Collapse the burst of events a single save usually produces.
            while let Ok(extra) = event_rx.try_recv() {
                debug!(kind = ?extra.kind, "coalesced config event");
            }

            match load_and_validate(&config_path) {
                Ok(cfg) => {
                    if runtime_tx
                        .send(ControlEvent::Reload(Box::new(cfg)))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => warn!(
                    config = %config_path.display(),
                    error = %e,
                    "config change rejected; keeping the running configuration"
                ),
            }
        }
        debug!("config watcher loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
