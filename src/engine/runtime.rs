// src/engine/runtime.rs

use std::fmt;
use std::process::Child;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::exec::{ChildNotifier, ClickOutcome, Pointer, Registry, SurfaceFactory};
use crate::types::MouseButton;

use super::{ControlEvent, Reactor, Readiness, RuntimeOptions, Timers};

/// Whether the loop should go on after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Drives executors in response to timers, pipe readiness, child exits and
/// control events.
///
/// One turn is: wait in the reactor, dispatch what woke it, then fire every
/// expired timer. Timers therefore always run after I/O of the same turn.
pub struct Runtime {
    registry: Registry,
    timers: Timers,
    reactor: Reactor,
    factory: Box<dyn SurfaceFactory>,
    options: RuntimeOptions,
    /// Children of torn-down executors, reaped as they exit.
    orphans: Vec<Child>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("orphans", &self.orphans.len())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Build the registry for `config` and arm every executor's first run.
    ///
    /// Must be called inside a tokio runtime, before any command is started.
    pub fn new(
        config: &ConfigFile,
        factory: Box<dyn SurfaceFactory>,
        control_rx: mpsc::Receiver<ControlEvent>,
        options: RuntimeOptions,
    ) -> Result<Self> {
        let notifier = ChildNotifier::new()?;
        let mut timers = Timers::new();
        let registry = Registry::build(config, &*factory, &mut timers, options.exit_when_idle);
        Ok(Self {
            registry,
            timers,
            reactor: Reactor::new(control_rx, notifier),
            factory,
            options,
            orphans: Vec::new(),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Main event loop.
    pub async fn run(mut self) -> Result<()> {
        info!("execbar runtime started");
        while self.turn().await == Flow::Continue {}
        self.shutdown();
        info!("runtime exiting");
        Ok(())
    }

    /// Run turns until `done` holds for the registry or the loop exits.
    pub async fn run_until<F>(&mut self, mut done: F) -> Flow
    where
        F: FnMut(&Registry) -> bool,
    {
        while !done(&self.registry) {
            if self.turn().await == Flow::Exit {
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// One wait/dispatch/fire cycle.
    pub async fn turn(&mut self) -> Flow {
        let deadline = self.timers.next_deadline();
        let readiness = self.reactor.wait(self.registry.pipes(), deadline).await;

        let flow = match readiness {
            Readiness::Control(event) => self.handle_control(event),
            Readiness::ControlClosed => Flow::Continue,
            Readiness::ChildExited => {
                self.registry.reap_children(&mut self.timers);
                self.orphans
                    .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
                Flow::Continue
            }
            Readiness::Pipe(id) => {
                debug!(executor = %id, "pipe ready");
                self.registry.drain_ready(&mut self.timers);
                Flow::Continue
            }
            Readiness::Timeout => Flow::Continue,
        };
        if flow == Flow::Exit {
            return flow;
        }

        for action in self.timers.fire_expired(Instant::now()) {
            self.registry.on_timer(action, &mut self.timers);
        }

        if self.options.exit_when_idle
            && self.registry.is_idle(&self.timers)
            && self.orphans.is_empty()
        {
            info!("all executors idle; exiting");
            return Flow::Exit;
        }
        Flow::Continue
    }

    /// Route a control event. Errors are logged; they never stop the loop.
    pub fn handle_control(&mut self, event: ControlEvent) -> Flow {
        debug!(?event, "control event");
        match event {
            ControlEvent::ForceUpdate { name } => {
                if let Err(e) = self.force_update(&name) {
                    warn!(executor = %name, error = %e, "refresh request failed");
                }
            }
            ControlEvent::Click {
                name,
                panel,
                button,
                pointer,
            } => {
                if let Err(e) = self.click(&name, panel, button, pointer) {
                    warn!(executor = %name, %button, error = %e, "click dropped");
                }
            }
            ControlEvent::Reload(config) => self.reload(&config),
            ControlEvent::Shutdown => {
                info!("shutdown requested");
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// Run executor `name` now. `Ok(false)` if it is still running.
    pub fn force_update(&mut self, name: &str) -> Result<bool> {
        self.registry.force_update_by_name(name, &mut self.timers)
    }

    /// Replay a pointer click on executor `name` as shown on `panel`.
    pub fn click(
        &mut self,
        name: &str,
        panel: usize,
        button: MouseButton,
        pointer: Pointer,
    ) -> Result<ClickOutcome> {
        self.registry
            .click(name, panel, button, pointer, &mut self.timers)
    }

    /// Tear the registry down in ownership order and build a new one.
    pub fn reload(&mut self, config: &ConfigFile) {
        info!("reloading configuration");
        let leftover = self.registry.teardown(&mut self.timers);
        self.orphans.extend(leftover);
        self.registry = Registry::build(
            config,
            &*self.factory,
            &mut self.timers,
            self.options.exit_when_idle,
        );
    }

    /// Hang up every running command.
    pub fn shutdown(&mut self) {
        let leftover = self.registry.teardown(&mut self.timers);
        self.orphans.extend(leftover);
        self.orphans
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
        if !self.orphans.is_empty() {
            debug!(children = self.orphans.len(), "children still exiting at shutdown");
        }
    }
}
