// src/watch/mod.rs

//! Reloading the configuration when its file changes.
//!
//! A `notify` watcher observes the directory holding the config file (editors
//! often replace files instead of writing them in place). Every relevant
//! change is re-validated; only a valid config is posted to the runtime.

pub mod watcher;

pub use watcher::{WatcherHandle, spawn_config_watcher};
