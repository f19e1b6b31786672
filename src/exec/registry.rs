// src/exec/registry.rs

//! Backends and the frontends that show them.
//!
//! Backends live in a table indexed by [`ExecutorId`], frontends in a second
//! table indexed by [`FrontendId`]. A backend refers to its frontends by id
//! and a frontend to its backend by id; neither holds a pointer to the other.
//!
//! Ownership order: frontends are destroyed before the backend they show.
//! Destroying a backend that still has frontends is a bug and panics.

use std::process::Child;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::engine::{TimerAction, Timers};
use crate::errors::{ExecbarError, Result};
use crate::types::MouseButton;

use super::ExecutorId;
use super::backend::{Backend, ClickOutcome};
use super::frontend::{Frontend, FrontendId, Pointer, SurfaceFactory};
use super::spawner::OutputPipe;

#[derive(Debug, Default)]
pub struct Registry {
    backends: Vec<Option<Backend>>,
    frontends: Vec<Option<Frontend>>,
    /// Skip rescheduling after a run (`--once`).
    run_once: bool,
}

impl Registry {
    /// Create one backend per configured executor and one frontend per
    /// (executor, panel) pair, then arm every executor's first run.
    ///
    /// Panels on a monitor the executor is not shown on get a placeholder
    /// frontend so `frontends()[panel]` lines up for every backend.
    pub fn build(
        config: &ConfigFile,
        factory: &dyn SurfaceFactory,
        timers: &mut Timers,
        run_once: bool,
    ) -> Self {
        let mut registry = Self {
            run_once,
            ..Self::default()
        };

        for exec in config.executors() {
            let id = ExecutorId(registry.backends.len());
            let timer = timers.create(format!("execp:{}", exec.name));
            let mut backend = Backend::new(id, exec.clone(), timer);

            for (panel, panel_cfg) in config.panel.iter().enumerate() {
                let frontend = if exec.shows_on_monitor(panel_cfg.monitor) {
                    Frontend::new(id, panel, factory.create(panel, &exec.name))
                } else {
                    Frontend::placeholder(id, panel)
                };
                let fid = FrontendId(registry.frontends.len());
                registry.frontends.push(Some(frontend));
                backend.frontends.push(fid);
            }

            backend.schedule_initial(timers);
            debug!(
                executor = %exec.name,
                frontends = backend.frontends.len(),
                "executor registered"
            );
            registry.backends.push(Some(backend));
        }

        info!(
            executors = registry.backends.len(),
            panels = config.panel.len(),
            "registry built"
        );
        registry
    }

    pub fn backend(&self, id: ExecutorId) -> Option<&Backend> {
        self.backends.get(id.0).and_then(Option::as_ref)
    }

    fn backend_mut(&mut self, id: ExecutorId) -> Option<&mut Backend> {
        self.backends.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn backends(&self) -> impl Iterator<Item = &Backend> {
        self.backends.iter().flatten()
    }

    pub fn frontend(&self, id: FrontendId) -> Option<&Frontend> {
        self.frontends.get(id.0).and_then(Option::as_ref)
    }

    pub fn live_frontends(&self) -> usize {
        self.frontends.iter().flatten().count()
    }

    pub fn find(&self, name: &str) -> Option<ExecutorId> {
        self.backends().find(|b| b.name() == name).map(Backend::id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Backend> {
        self.find(name).and_then(|id| self.backend(id))
    }

    /// Output pipes of every running command, for the readiness wait.
    pub fn pipes(&self) -> Vec<(ExecutorId, &OutputPipe)> {
        self.backends()
            .flat_map(|b| b.pipes().map(move |p| (b.id(), p)))
            .collect()
    }

    /// Nothing armed, nothing running, nothing left to reap.
    pub fn is_idle(&self, timers: &Timers) -> bool {
        !timers.any_enabled() && self.backends().all(Backend::is_quiet)
    }

    pub fn on_timer(&mut self, action: TimerAction, timers: &mut Timers) {
        match action {
            TimerAction::Run(id) => self.run(id, timers),
        }
    }

    /// Start a run of `id`. A failed spawn is logged and retried on the next
    /// scheduled run.
    fn run(&mut self, id: ExecutorId, timers: &mut Timers) {
        let run_once = self.run_once;
        let Some(backend) = self.backend_mut(id) else {
            return;
        };
        match backend.spawn() {
            Ok(true) => self.broadcast(id, timers),
            Ok(false) => {}
            Err(e) => {
                warn!(executor = %backend.name(), error = %e, "spawn failed; will retry later");
                if !run_once {
                    backend.schedule_next(timers);
                }
            }
        }
    }

    /// Service every ready output pipe once.
    pub fn drain_ready(&mut self, timers: &mut Timers) {
        for idx in 0..self.backends.len() {
            self.read_output(ExecutorId(idx), timers);
        }
    }

    pub fn read_output(&mut self, id: ExecutorId, timers: &mut Timers) {
        let run_once = self.run_once;
        let Some(backend) = self.backend_mut(id) else {
            return;
        };
        if !backend.is_running() {
            return;
        }

        let outcome = backend.read_output();
        if outcome.finished {
            debug!(executor = %backend.name(), "run finished");
            if run_once {
                timers.stop(backend.timer());
            } else {
                backend.schedule_next(timers);
            }
        }
        if outcome.changed || outcome.finished {
            self.broadcast(id, timers);
        }
    }

    /// Run `id` now unless it is already running. Returns whether a run was
    /// started.
    pub fn force_update(&mut self, id: ExecutorId, timers: &mut Timers) -> bool {
        let Some(backend) = self.backend_mut(id) else {
            return false;
        };
        if backend.is_running() {
            debug!(executor = %backend.name(), "force update ignored; command still running");
            return false;
        }
        info!(executor = %backend.name(), "forced update");
        timers.stop(backend.timer());
        self.run(id, timers);
        self.backend(id).is_some_and(Backend::is_running)
    }

    pub fn force_update_by_name(&mut self, name: &str, timers: &mut Timers) -> Result<bool> {
        let id = self
            .find(name)
            .ok_or_else(|| ExecbarError::ExecutorNotFound(name.to_string()))?;
        Ok(self.force_update(id, timers))
    }

    /// Handle a pointer click on the frontend of `name` on `panel`.
    pub fn click(
        &mut self,
        name: &str,
        panel: usize,
        button: MouseButton,
        pointer: Pointer,
        timers: &mut Timers,
    ) -> Result<ClickOutcome> {
        let id = self
            .find(name)
            .ok_or_else(|| ExecbarError::ExecutorNotFound(name.to_string()))?;

        let env = self
            .backend(id)
            .and_then(|b| b.frontends().get(panel))
            .and_then(|fid| self.frontend(*fid))
            .map(|f| f.click_env(pointer))
            .unwrap_or_default();

        let Some(backend) = self.backend_mut(id) else {
            return Err(ExecbarError::ExecutorNotFound(name.to_string()));
        };
        let outcome = backend.click(button, &env)?;
        if outcome == ClickOutcome::Refresh {
            debug!(executor = %name, %button, "no command bound; refreshing");
            self.force_update(id, timers);
        }
        Ok(outcome)
    }

    /// Reap exited children after a child-exit notification. Executors whose
    /// click commands finished are refreshed if configured to.
    pub fn reap_children(&mut self, timers: &mut Timers) {
        for idx in 0..self.backends.len() {
            let id = ExecutorId(idx);
            let Some(backend) = self.backend_mut(id) else {
                continue;
            };
            let released = backend.reap();
            if released.is_empty() || !backend.config().refresh_after_click {
                continue;
            }
            debug!(executor = %backend.name(), ?released, "click commands done");
            self.force_update(id, timers);
        }
    }

    /// Push the backend's current content and tooltip to all its frontends.
    pub fn broadcast(&mut self, id: ExecutorId, timers: &Timers) {
        let Some(backend) = self.backends.get(id.0).and_then(Option::as_ref) else {
            return;
        };
        let now = Instant::now();
        let tooltip = backend.tooltip(now, timers.deadline(backend.timer()));

        for fid in backend.frontends() {
            if let Some(frontend) = self.frontends.get_mut(fid.0).and_then(Option::as_mut) {
                frontend.refresh(backend.content(), Some(&tooltip));
            }
        }
    }

    pub fn destroy_frontend(&mut self, fid: FrontendId) {
        let Some(frontend) = self.frontends.get_mut(fid.0).and_then(Option::take) else {
            return;
        };
        if let Some(backend) = self.backend_mut(frontend.backend()) {
            backend.frontends.retain(|f| *f != fid);
        }
    }

    /// Remove a backend, destroy its timer and hang up its running command.
    /// Returns children still to be reaped.
    ///
    /// # Panics
    ///
    /// If any frontend still refers to the backend.
    pub fn destroy_backend(&mut self, id: ExecutorId, timers: &mut Timers) -> Vec<Child> {
        let Some(slot) = self.backends.get_mut(id.0) else {
            return Vec::new();
        };
        if let Some(backend) = slot.as_ref() {
            assert!(
                backend.frontends().is_empty(),
                "executor '{}' destroyed while {} frontend(s) still show it",
                backend.name(),
                backend.frontends().len()
            );
        }
        let Some(mut backend) = slot.take() else {
            return Vec::new();
        };
        timers.destroy(backend.timer());
        backend.shutdown()
    }

    /// Destroy everything in ownership order: all frontends, then all
    /// backends.
    pub fn teardown(&mut self, timers: &mut Timers) -> Vec<Child> {
        for idx in 0..self.frontends.len() {
            self.destroy_frontend(FrontendId(idx));
        }
        let mut leftover = Vec::new();
        for idx in 0..self.backends.len() {
            leftover.extend(self.destroy_backend(ExecutorId(idx), timers));
        }
        self.frontends.clear();
        self.backends.clear();
        info!(children = leftover.len(), "registry torn down");
        leftover
    }
}
