// src/exec/mod.rs

//! Executor layer: running configured commands and turning their output into
//! panel content.
//!
//! - [`spawner`] starts `/bin/sh -c` children with non-blocking pipes.
//! - [`buffer`] and [`parser`] drain and interpret their output.
//! - [`backend`] holds one executor's state machine.
//! - [`frontend`] holds the per-panel views and the `Surface` collaborator.
//! - [`registry`] owns both and enforces their destruction order.
//! - [`notifier`] reports child exits to the control loop.

use std::fmt;

pub mod backend;
pub mod buffer;
pub mod frontend;
pub mod notifier;
pub mod parser;
pub mod registry;
pub mod spawner;
pub mod stdin;
pub mod tooltip;

/// Index of a backend in the [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutorId(pub(crate) usize);

impl fmt::Display for ExecutorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub use backend::{Backend, ClickOutcome, ReadOutcome};
pub use frontend::{Frontend, FrontendId, Geometry, Pointer, Surface, SurfaceFactory};
pub use notifier::ChildNotifier;
pub use parser::Content;
pub use registry::Registry;
