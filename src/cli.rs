// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;
use crate::types::MouseButton;

/// Command-line arguments for `execbar`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "execbar",
    version,
    about = "Run shell commands in the background and show their output on panels.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `execbar.toml` in the current working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Run every executor once and exit when nothing is left running.
    #[arg(long)]
    pub once: bool,

    /// Do not reload the configuration when the file changes.
    #[arg(long)]
    pub no_watch: bool,

    /// Control socket path (defaults to `$XDG_RUNTIME_DIR/execbar.sock`).
    #[arg(long, value_name = "PATH")]
    pub socket: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EXECBAR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print executors, but don't run any commands.
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<ClientCommand>,
}

/// Messages sent to an already running instance over its control socket.
#[derive(Debug, Clone, Subcommand)]
pub enum ClientCommand {
    /// Re-run an executor's command now (no-op if it is still running).
    Refresh {
        /// Executor name as configured in `[[item]] name = ...`.
        name: String,
    },
    /// Replay a pointer click on an executor.
    Click {
        name: String,
        /// Button name (left, middle, right, wheel_up, wheel_down) or 1-5.
        #[arg(value_parser = parse_button)]
        button: MouseButton,
        /// Panel index the click happened on.
        #[arg(long, default_value_t = 0)]
        panel: usize,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_button(s: &str) -> Result<MouseButton, String> {
    s.parse()
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

impl CliArgs {
    /// Config file to load: `--config`, else the default location.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path)
    }
}
