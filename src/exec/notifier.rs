// src/exec/notifier.rs

//! Child-exit notification for the control loop.
//!
//! tokio installs the actual `SIGCHLD` handler; all it does is poke a
//! self-pipe owned by the runtime driver. The notifier only tells the control
//! loop "some child changed state". Finding out which one, and reaping it, is
//! done by the registry with `try_wait` on the children it tracks.

use std::io;

use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::trace;

#[derive(Debug)]
pub struct ChildNotifier {
    sigchld: Signal,
}

impl ChildNotifier {
    /// Register for `SIGCHLD`. Must be called from inside a tokio runtime,
    /// before any child is spawned, so no exit is missed.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            sigchld: signal(SignalKind::child())?,
        })
    }

    /// Wait until at least one child has exited since the last call.
    ///
    /// Several exits may be coalesced into one notification.
    pub async fn notified(&mut self) -> Option<()> {
        let res = self.sigchld.recv().await;
        trace!("child exit notification");
        res
    }
}
