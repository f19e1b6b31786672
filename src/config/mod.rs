// src/config/mod.rs

//! Configuration loading and validation for execbar.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like unique executor names (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_and_validate};
pub use model::{
    ConfigFile, ExecutorConfig, MouseAction, MouseBindings, PanelConfig, PanelItem, RawConfigFile,
};
