// src/engine/mod.rs

//! Control loop for execbar.
//!
//! This module ties together:
//! - the timer registry (when each executor runs next)
//! - the reactor (the one place the loop suspends)
//! - the runtime, which dispatches whatever woke the reactor to the
//!   executor registry and then fires expired timers
//!
//! Everything runs on a single thread; no executor state is ever shared
//! across tasks.

use crate::config::ConfigFile;
use crate::exec::{ExecutorId, Pointer};
use crate::types::MouseButton;

pub mod reactor;
pub mod runtime;
pub mod timer;

/// What a timer does when it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Start a run of this executor.
    Run(ExecutorId),
}

/// Timer registry as used by the engine.
pub type Timers = timer::TimerRegistry<TimerAction>;

/// Runtime options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Run every executor once and stop once nothing is armed, running or
    /// waiting to be reaped (used for `--once`).
    pub exit_when_idle: bool,
}

/// Requests flowing into the runtime from the control socket, the config
/// watcher and signal handlers.
#[derive(Debug, Clone)]
pub enum ControlEvent {
    /// Run an executor now (no-op if it is still running).
    ForceUpdate { name: String },
    /// A pointer click on an executor's surface on `panel`.
    Click {
        name: String,
        panel: usize,
        button: MouseButton,
        pointer: Pointer,
    },
    /// Replace the running configuration.
    Reload(Box<ConfigFile>),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    Shutdown,
}

pub use reactor::{Reactor, Readiness};
pub use runtime::Runtime;
pub use timer::{TimerId, TimerRegistry};
