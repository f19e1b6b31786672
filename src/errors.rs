// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecbarError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Executor not found: {0}")]
    ExecutorNotFound(String),

    #[error("Failed to spawn command for executor '{executor}': {source}")]
    Spawn {
        executor: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Executor '{0}' has no running interactive command to receive input")]
    NotInteractive(String),

    #[error("Executor '{executor}': command sink {sink} is not supported")]
    UnsupportedSink { executor: String, sink: i32 },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ExecbarError>;
