// src/exec/backend.rs

//! One configured executor: its immutable config plus the mutable state of
//! its runs.
//!
//! Methods here never broadcast to frontends or arm timers themselves. They
//! report what happened (`ReadOutcome`, `ClickOutcome`, released pids) and
//! the [`Registry`](super::Registry) acts on it.

use std::collections::HashMap;
use std::process::Child;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::config::ExecutorConfig;
use crate::engine::{TimerAction, TimerId, Timers};
use crate::errors::{ExecbarError, Result};
use crate::types::{MouseButton, Sink};

use super::ExecutorId;
use super::buffer::OutputBuffer;
use super::frontend::FrontendId;
use super::parser::{self, CLEAR_SCREEN, Content, MAX_TOOLTIP_BYTES};
use super::spawner::{self, OutputPipe, SpawnedChild};
use super::stdin::{self, LineWrite};
use super::tooltip::{RunTimes, status_tooltip};

/// Delay before the very first run of every executor.
pub const INITIAL_DELAY: Duration = Duration::from_millis(10);

/// Mutable per-executor state, shared by all of its frontends.
#[derive(Debug, Default)]
pub struct ExecutorState {
    running: Option<SpawnedChild>,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
    content: Content,
    stderr_tooltip: Option<String>,
    last_start: Option<Instant>,
    last_finish: Option<Instant>,
    last_duration: Option<Duration>,
    /// Detached click commands, by pid, until they are reaped.
    click_children: HashMap<u32, Child>,
    /// Polling children whose output is done but which were not reaped yet.
    exited: Vec<Child>,
}

/// What a read pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Text, icon or tooltip changed; frontends need a refresh.
    pub changed: bool,
    /// The run is over (both output pipes reached end of file).
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Spawned(u32),
    WroteStdin(LineWrite),
    /// No command bound to the button; the caller should force an update.
    Refresh,
}

#[derive(Debug)]
pub struct Backend {
    id: ExecutorId,
    config: ExecutorConfig,
    state: ExecutorState,
    timer: TimerId,
    pub(crate) frontends: Vec<FrontendId>,
}

impl Backend {
    pub fn new(id: ExecutorId, config: ExecutorConfig, timer: TimerId) -> Self {
        let state = ExecutorState {
            content: Content {
                markup: config.markup,
                ..Content::default()
            },
            ..ExecutorState::default()
        };
        Self {
            id,
            config,
            state,
            timer,
            frontends: Vec::new(),
        }
    }

    pub fn id(&self) -> ExecutorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn timer(&self) -> TimerId {
        self.timer
    }

    pub fn frontends(&self) -> &[FrontendId] {
        &self.frontends
    }

    pub fn content(&self) -> &Content {
        &self.state.content
    }

    pub fn is_running(&self) -> bool {
        self.state.running.is_some()
    }

    pub fn running_pid(&self) -> Option<u32> {
        self.state.running.as_ref().map(|r| r.pid)
    }

    /// Pids of click-spawned processes not reaped yet, sorted.
    pub fn click_pids(&self) -> Vec<u32> {
        let mut pids: Vec<_> = self.state.click_children.keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    /// Nothing running and nothing left to reap.
    pub fn is_quiet(&self) -> bool {
        self.state.running.is_none()
            && self.state.click_children.is_empty()
            && self.state.exited.is_empty()
    }

    /// The running child can take sink-0 commands.
    pub fn has_interactive_stdin(&self) -> bool {
        self.config.is_continuous()
            && self
                .state
                .running
                .as_ref()
                .is_some_and(|r| r.stdin.is_some())
    }

    /// Open output pipes of the running child.
    pub fn pipes(&self) -> impl Iterator<Item = &OutputPipe> {
        self.state
            .running
            .iter()
            .flat_map(|r| r.stdout.iter().chain(r.stderr.iter()))
    }

    pub fn schedule_initial(&self, timers: &mut Timers) {
        timers.schedule(
            self.timer,
            true,
            INITIAL_DELAY,
            Duration::ZERO,
            TimerAction::Run(self.id),
        );
    }

    /// Arm the next polling run, or stop for good if `interval == 0`.
    pub fn schedule_next(&self, timers: &mut Timers) {
        match self.config.poll_interval() {
            Some(interval) => timers.schedule(
                self.timer,
                true,
                interval,
                Duration::ZERO,
                TimerAction::Run(self.id),
            ),
            None => {
                debug!(executor = %self.config.name, "interval is 0; not rescheduling");
                timers.stop(self.timer);
            }
        }
    }

    /// Start the command. Returns `Ok(false)` if a run is still in progress.
    pub fn spawn(&mut self) -> Result<bool> {
        if self.state.running.is_some() {
            debug!(executor = %self.config.name, "previous run still active; skipping");
            return Ok(false);
        }

        let spawned = spawner::spawn_piped(&self.config.command, self.config.needs_stdin())
            .map_err(|source| ExecbarError::Spawn {
                executor: self.config.name.clone(),
                source,
            })?;

        info!(
            executor = %self.config.name,
            pid = spawned.pid,
            pgid = spawned.pgid(),
            cmd = %self.config.command,
            "started command"
        );

        self.state.stdout.clear();
        self.state.stderr.clear();
        self.state.last_start = Some(Instant::now());
        self.state.running = Some(spawned);
        Ok(true)
    }

    /// Drain whichever output pipes are ready and interpret the result.
    pub fn read_output(&mut self) -> ReadOutcome {
        let mut outcome = ReadOutcome::default();
        let state = &mut self.state;
        let Some(run) = state.running.as_mut() else {
            return outcome;
        };

        let out_bytes = drain_ready(&mut run.stdout, &mut state.stdout);
        let err_bytes = drain_ready(&mut run.stderr, &mut state.stderr);
        let done = run.outputs_closed();
        trace!(
            executor = %self.config.name,
            out_bytes,
            err_bytes,
            done,
            "drained output"
        );

        if self.config.is_continuous() {
            outcome.changed = self.interpret_continuous(out_bytes, err_bytes);
        }

        if done {
            self.finish_run();
            outcome.finished = true;
            if !self.config.is_continuous() {
                self.interpret_oneshot();
                outcome.changed = true;
            }
        }

        outcome
    }

    fn interpret_continuous(&mut self, out_bytes: usize, err_bytes: usize) -> bool {
        let mut changed = false;
        let state = &mut self.state;

        let chunk = if out_bytes > 0 {
            parser::take_continuous_chunks(
                &mut state.stdout,
                self.config.continuous,
                self.config.has_icon,
            )
        } else {
            None
        };
        if let Some(mut content) = chunk {
            content.markup = self.config.markup;
            debug!(executor = %self.config.name, text = %content.text, "new chunk");
            // Every chunk counts as a completed update.
            let now = Instant::now();
            state.last_finish = Some(now);
            state.last_duration = state.last_start.map(|start| now - start);
            changed |= content != state.content;
            state.content = content;
        }

        if err_bytes > 0 && self.config.tooltip.is_none() {
            // Only the part after the last clear-screen can ever be shown.
            if let Some(pos) = state
                .stderr
                .as_bytes()
                .windows(CLEAR_SCREEN.len())
                .rposition(|w| w == CLEAR_SCREEN)
            {
                state.stderr.consume_front(pos + CLEAR_SCREEN.len());
            }
            state.stderr.truncate(MAX_TOOLTIP_BYTES);
            let tooltip = parser::extract_tooltip(state.stderr.as_bytes());
            changed |= tooltip != state.stderr_tooltip;
            state.stderr_tooltip = tooltip;
        }

        changed
    }

    fn interpret_oneshot(&mut self) {
        let state = &mut self.state;
        let mut content = parser::interpret_oneshot(state.stdout.as_bytes(), self.config.has_icon);
        content.markup = self.config.markup;
        debug!(executor = %self.config.name, text = %content.text, "command output");
        state.content = content;
        if self.config.tooltip.is_none() {
            state.stderr_tooltip = parser::extract_tooltip(state.stderr.as_bytes());
        }
    }

    /// Close out the current run: timestamps, pipes, and the child handle.
    fn finish_run(&mut self) {
        let Some(run) = self.state.running.take() else {
            return;
        };
        let now = Instant::now();
        self.state.last_finish = Some(now);
        self.state.last_duration = self.state.last_start.map(|start| now - start);

        let SpawnedChild {
            mut child, pid, ..
        } = run;
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(executor = %self.config.name, pid, ?status, "command finished");
            }
            Ok(None) => {
                trace!(executor = %self.config.name, pid, "output closed before exit");
                self.state.exited.push(child);
            }
            Err(e) => {
                warn!(executor = %self.config.name, pid, error = %e, "try_wait failed");
            }
        }

        if self.config.is_continuous() {
            // A partial chunk at end of file is never shown.
            self.state.stdout.clear();
            self.state.stderr.clear();
        }
    }

    /// Route a pointer click to the command bound to `button`.
    pub fn click(&mut self, button: MouseButton, env: &[(&str, String)]) -> Result<ClickOutcome> {
        let Some(action) = self.config.on_click.get(button).cloned() else {
            return Ok(ClickOutcome::Refresh);
        };

        match action.sink {
            Sink::Spawn => {
                let child = spawner::spawn_detached(&action.command, env).map_err(|source| {
                    ExecbarError::Spawn {
                        executor: self.config.name.clone(),
                        source,
                    }
                })?;
                let pid = child.id();
                info!(executor = %self.config.name, %button, pid, "click command started");
                self.state.click_children.insert(pid, child);
                Ok(ClickOutcome::Spawned(pid))
            }
            Sink::Stdin => self.write_stdin(&action.command).map(ClickOutcome::WroteStdin),
            Sink::Shared(n) => Err(ExecbarError::UnsupportedSink {
                executor: self.config.name.clone(),
                sink: i32::from(n),
            }),
        }
    }

    /// Write `line` to the stdin of the running continuous command.
    pub fn write_stdin(&mut self, line: &str) -> Result<LineWrite> {
        if !self.has_interactive_stdin() {
            return Err(ExecbarError::NotInteractive(self.config.name.clone()));
        }
        let Some(pipe) = self.state.running.as_mut().and_then(|r| r.stdin.as_mut()) else {
            return Err(ExecbarError::NotInteractive(self.config.name.clone()));
        };
        let written = stdin::write_line(pipe, line)?;
        debug!(executor = %self.config.name, bytes = written.written, "wrote to command stdin");
        Ok(written)
    }

    /// Reap exited children. Returns the pids of released click processes.
    pub fn reap(&mut self) -> Vec<u32> {
        let name = &self.config.name;
        let mut released = Vec::new();

        self.state.click_children.retain(|pid, child| match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(executor = %name, pid, ?status, "click command exited");
                released.push(*pid);
                false
            }
            Err(e) => {
                warn!(executor = %name, pid, error = %e, "lost track of click command");
                released.push(*pid);
                false
            }
        });

        self.state
            .exited
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));

        released.sort_unstable();
        released
    }

    /// Tooltip shown on this executor's surfaces.
    ///
    /// A configured tooltip wins, then stderr output, then a status line.
    pub fn tooltip(&self, now: Instant, next_run: Option<Instant>) -> String {
        if let Some(user) = &self.config.tooltip {
            return user.clone();
        }
        if let Some(stderr) = &self.state.stderr_tooltip {
            return stderr.clone();
        }
        let state = &self.state;
        status_tooltip(&RunTimes {
            running_for: state
                .running
                .as_ref()
                .and(state.last_start)
                .map(|start| now.saturating_duration_since(start)),
            finished_ago: state
                .last_finish
                .map(|finish| now.saturating_duration_since(finish)),
            last_duration: state.last_duration,
            next_in: next_run.map(|at| at.saturating_duration_since(now)),
        })
    }

    /// Stop everything for teardown. The running command's process group
    /// gets `SIGHUP`; children still to be reaped are handed back.
    pub fn shutdown(&mut self) -> Vec<Child> {
        let mut leftover = Vec::new();
        if let Some(run) = self.state.running.take() {
            info!(executor = %self.config.name, pgid = run.pgid(), "hanging up running command");
            spawner::signal_group(run.pgid(), libc::SIGHUP);
            leftover.push(run.child);
        }
        leftover.append(&mut self.state.exited);
        leftover.extend(self.state.click_children.drain().map(|(_, child)| child));
        leftover
    }
}

impl Drop for Backend {
    fn drop(&mut self) {
        if let Some(run) = &self.state.running {
            spawner::signal_group(run.pgid(), libc::SIGHUP);
        }
    }
}

/// Drain `slot` into `buf` if it is ready, closing it at end of file.
/// Returns the number of bytes read.
fn drain_ready(slot: &mut Option<OutputPipe>, buf: &mut OutputBuffer) -> usize {
    let Some(pipe) = slot.as_ref() else {
        return 0;
    };
    let Some(Ok(mut guard)) = pipe.readable().now_or_never() else {
        return 0;
    };

    let mut reader = guard.get_ref().get_ref();
    let drained = buf.drain(&mut reader);
    if drained.eof {
        drop(guard);
        *slot = None;
    } else {
        guard.clear_ready();
    }
    drained.bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Timers;

    fn continuous_backend(lines: usize) -> Backend {
        let mut timers = Timers::new();
        let timer = timers.create("execp:test");
        let mut config = ExecutorConfig::new("test", "true");
        config.continuous = lines;
        Backend::new(ExecutorId(0), config, timer)
    }

    #[test]
    fn continuous_stderr_stays_bounded_without_clear_screen() {
        let mut b = continuous_backend(1);
        let noise = vec![b'x'; 1000];
        for _ in 0..1000 {
            b.state.stderr.extend_from_slice(&noise);
            b.interpret_continuous(0, noise.len());
            assert!(b.state.stderr.len() <= MAX_TOOLTIP_BYTES);
        }
        let tooltip = b.state.stderr_tooltip.clone().unwrap_or_default();
        assert_eq!(tooltip.len(), MAX_TOOLTIP_BYTES);

        // A clear-screen after the cap still replaces the tooltip.
        b.state.stderr.extend_from_slice(b"\x1b[2Jfresh\n");
        assert!(b.interpret_continuous(0, 10));
        assert_eq!(b.state.stderr_tooltip.as_deref(), Some("fresh"));
    }

    #[test]
    fn each_continuous_chunk_counts_as_a_finished_update() {
        let mut b = continuous_backend(1);
        let start = Instant::now();
        b.state.last_start = Some(start);
        assert!(b.state.last_finish.is_none());

        b.state.stdout.extend_from_slice(b"42\n");
        assert!(b.interpret_continuous(3, 0));

        assert!(b.state.last_finish.is_some_and(|at| at >= start));
        assert!(b.state.last_duration.is_some());
        let tooltip = b.tooltip(Instant::now(), None);
        assert!(tooltip.starts_with("Last update finished"), "{tooltip}");
    }
}
