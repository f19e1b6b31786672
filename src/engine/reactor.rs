// src/engine/reactor.rs

//! The single suspension point of the control loop.
//!
//! [`Reactor::wait`] waits, at most until the next timer deadline, for the
//! first of: a control event, a child-exit notification, or readiness on any
//! open output pipe. Signal interruptions are absorbed by tokio's driver and
//! never surface here.

use futures::future::{self, select_all};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};

use crate::exec::spawner::OutputPipe;
use crate::exec::{ChildNotifier, ExecutorId};

use super::ControlEvent;

/// What ended a [`Reactor::wait`].
#[derive(Debug)]
pub enum Readiness {
    Control(ControlEvent),
    /// Every control sender is gone. Reported once.
    ControlClosed,
    /// At least one child exited.
    ChildExited,
    /// An output pipe of this executor is readable (data or end of file).
    Pipe(ExecutorId),
    /// The deadline passed.
    Timeout,
}

#[derive(Debug)]
pub struct Reactor {
    control_rx: mpsc::Receiver<ControlEvent>,
    control_open: bool,
    notifier: ChildNotifier,
}

impl Reactor {
    pub fn new(control_rx: mpsc::Receiver<ControlEvent>, notifier: ChildNotifier) -> Self {
        Self {
            control_rx,
            control_open: true,
            notifier,
        }
    }

    /// Wait for the next source to become ready. With no `deadline` and no
    /// pipes this blocks until a control event or child exit arrives.
    pub async fn wait(
        &mut self,
        pipes: Vec<(ExecutorId, &OutputPipe)>,
        deadline: Option<Instant>,
    ) -> Readiness {
        trace!(pipes = pipes.len(), ?deadline, "waiting");

        let pipe_ready = async move {
            if pipes.is_empty() {
                return future::pending().await;
            }
            let waits = pipes.into_iter().map(|(id, pipe)| {
                Box::pin(async move {
                    // An error here still means "go and read it".
                    let _ = pipe.readable().await;
                    id
                })
            });
            select_all(waits).await.0
        };

        let timeout = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => future::pending().await,
            }
        };

        tokio::select! {
            biased;

            event = self.control_rx.recv(), if self.control_open => match event {
                Some(event) => Readiness::Control(event),
                None => {
                    debug!("control channel closed");
                    self.control_open = false;
                    Readiness::ControlClosed
                }
            },
            _ = self.notifier.notified() => Readiness::ChildExited,
            id = pipe_ready => Readiness::Pipe(id),
            _ = timeout => Readiness::Timeout,
        }
    }
}
