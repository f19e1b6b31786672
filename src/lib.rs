// src/lib.rs

pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod ipc;
pub mod logging;
pub mod types;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, PanelItem, load_and_validate};
use crate::display::ConsoleSurfaceFactory;
use crate::engine::{ControlEvent, Runtime, RuntimeOptions};

/// High-level entry point used by `main.rs`.
///
/// With a client subcommand this only sends one request to a running
/// instance. Otherwise it wires together:
/// - config loading
/// - the runtime (timers, reactor, executor registry)
/// - the control socket
/// - (optional) config reload watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let socket_path = args
        .socket
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(ipc::default_socket_path);

    if let Some(cmd) = &args.command {
        return ipc::send_command(&socket_path, cmd).await;
    }

    let config_path = args.config_path();
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let (ctl_tx, ctl_rx) = mpsc::channel::<ControlEvent>(64);

    let options = RuntimeOptions {
        exit_when_idle: args.once,
    };
    let runtime = Runtime::new(&cfg, Box::new(ConsoleSurfaceFactory), ctl_rx, options)?;

    // A second instance may still own the socket; run without one then.
    let listener = match ipc::spawn_listener(&socket_path, ctl_tx.clone()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "control socket unavailable; refresh requests disabled");
            None
        }
    };

    let _watcher_handle = if !args.once && !args.no_watch {
        Some(watch::spawn_config_watcher(&config_path, ctl_tx.clone())?)
    } else {
        None
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = ctl_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(ControlEvent::Shutdown).await;
        });
    }

    info!(
        executors = cfg.executors().count(),
        panels = cfg.panel.len(),
        socket = %socket_path.display(),
        "execbar starting"
    );
    runtime.run().await?;

    if listener.is_some() {
        let _ = std::fs::remove_file(&socket_path);
    }
    Ok(())
}

/// Simple dry-run output: print panels, items and click bindings.
fn print_dry_run(cfg: &ConfigFile) {
    println!("execbar dry-run");
    println!();

    println!("panels ({}):", cfg.panel.len());
    for (idx, panel) in cfg.panel.iter().enumerate() {
        println!("  - panel {idx} on monitor {}", panel.monitor);
    }
    println!();

    println!("items ({}):", cfg.item.len());
    for item in cfg.item.iter() {
        let exec = match item {
            PanelItem::Separator => {
                println!("  - (separator)");
                continue;
            }
            PanelItem::Executor(exec) => exec,
        };
        println!("  - {}", exec.name);
        println!("      command: {}", exec.command);
        println!("      interval: {}s", exec.interval);
        if exec.is_continuous() {
            println!("      continuous: {} line(s) per update", exec.continuous);
        }
        if exec.has_icon {
            println!("      has_icon: true");
        }
        if let Some(monitor) = exec.monitor {
            println!("      monitor: {monitor}");
        }
        if let Some(ref tooltip) = exec.tooltip {
            println!("      tooltip: {tooltip}");
        }
        for (button, action) in exec.on_click.iter() {
            println!(
                "      on_click.{button}: {} (sink {})",
                action.command,
                action.sink.id()
            );
        }
    }

    debug!("dry-run complete (no execution)");
}
