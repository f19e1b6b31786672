// src/engine/timer.rs

//! Named, optionally periodic deadlines.
//!
//! The registry is a pure data structure: it never sleeps and never calls
//! back into user code. [`TimerRegistry::fire_expired`] returns the payloads
//! of every timer that expired, and the runtime dispatches them after the
//! pass is over. Timers armed while dispatching are therefore only seen by
//! the *next* pass.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Handle to a timer owned by some component. Ids are never reused, so
/// iteration order over them is registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<T> {
    name: String,
    enabled: bool,
    expiration: Instant,
    period: Duration,
    arg: Option<T>,
}

#[derive(Debug)]
pub struct TimerRegistry<T> {
    timers: BTreeMap<TimerId, Timer<T>>,
    next_id: u64,
}

impl<T> Default for TimerRegistry<T> {
    fn default() -> Self {
        Self {
            timers: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T: Clone> TimerRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a disabled timer. `name` only shows up in logs.
    pub fn create(&mut self, name: impl Into<String>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert(
            id,
            Timer {
                name: name.into(),
                enabled: false,
                expiration: Instant::now(),
                period: Duration::ZERO,
                arg: None,
            },
        );
        id
    }

    /// Drop a timer. Unknown ids are ignored.
    pub fn destroy(&mut self, id: TimerId) {
        if let Some(timer) = self.timers.remove(&id) {
            trace!(timer = %timer.name, "timer destroyed");
        }
    }

    /// Arm or disarm `id`.
    ///
    /// When `enabled`, the timer expires `delay` from now and, if `period`
    /// is non-zero, keeps firing every `period` after that. When not
    /// enabled the timer is excluded from [`next_deadline`](Self::next_deadline).
    pub fn schedule(
        &mut self,
        id: TimerId,
        enabled: bool,
        delay: Duration,
        period: Duration,
        arg: T,
    ) {
        self.schedule_at(id, enabled, Instant::now(), delay, period, arg);
    }

    /// [`schedule`](Self::schedule) relative to an explicit `now`.
    pub fn schedule_at(
        &mut self,
        id: TimerId,
        enabled: bool,
        now: Instant,
        delay: Duration,
        period: Duration,
        arg: T,
    ) {
        let Some(timer) = self.timers.get_mut(&id) else {
            warn!(?id, "schedule on unknown timer ignored");
            return;
        };
        timer.enabled = enabled;
        timer.expiration = now + delay;
        timer.period = period;
        timer.arg = Some(arg);
        debug!(
            timer = %timer.name,
            enabled,
            delay_ms = delay.as_millis() as u64,
            period_ms = period.as_millis() as u64,
            "timer changed"
        );
    }

    pub fn stop(&mut self, id: TimerId) {
        if let Some(timer) = self.timers.get_mut(&id) {
            timer.enabled = false;
        }
    }

    pub fn is_enabled(&self, id: TimerId) -> bool {
        self.timers.get(&id).is_some_and(|t| t.enabled)
    }

    /// Expiration of `id`, if it is armed.
    pub fn deadline(&self, id: TimerId) -> Option<Instant> {
        self.timers
            .get(&id)
            .filter(|t| t.enabled)
            .map(|t| t.expiration)
    }

    /// Whether any timer is armed.
    pub fn any_enabled(&self) -> bool {
        self.timers.values().any(|t| t.enabled)
    }

    /// Earliest expiration among enabled timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers
            .values()
            .filter(|t| t.enabled)
            .map(|t| t.expiration)
            .min()
    }

    /// Collect every enabled timer with `expiration <= now`, in registration
    /// order.
    ///
    /// Periodic timers are re-armed at `now + period` (not
    /// `expiration + period`) so a late wake-up never causes catch-up
    /// bursts; one-shot timers are disabled.
    pub fn fire_expired(&mut self, now: Instant) -> Vec<T> {
        let mut fired = Vec::new();

        for timer in self.timers.values_mut() {
            if !timer.enabled || timer.expiration > now {
                continue;
            }
            let Some(arg) = timer.arg.clone() else {
                timer.enabled = false;
                continue;
            };

            trace!(timer = %timer.name, "timer expired");
            if timer.period.is_zero() {
                timer.enabled = false;
            } else {
                timer.expiration = now + timer.period;
            }
            fired.push(arg);
        }

        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn disabled_timers_have_no_deadline() {
        let mut timers = TimerRegistry::<u32>::new();
        let a = timers.create("a");
        assert_eq!(timers.next_deadline(), None);

        let now = Instant::now();
        timers.schedule_at(a, false, now, 5 * MS, Duration::ZERO, 1);
        assert_eq!(timers.next_deadline(), None);
        assert!(!timers.any_enabled());
    }

    #[test]
    fn next_deadline_is_the_minimum_enabled_expiration() {
        let mut timers = TimerRegistry::<u32>::new();
        let a = timers.create("a");
        let b = timers.create("b");
        let now = Instant::now();
        timers.schedule_at(a, true, now, 50 * MS, Duration::ZERO, 1);
        timers.schedule_at(b, true, now, 20 * MS, Duration::ZERO, 2);
        assert_eq!(timers.next_deadline(), Some(now + 20 * MS));

        timers.stop(b);
        assert_eq!(timers.next_deadline(), Some(now + 50 * MS));
    }

    #[test]
    fn one_shot_fires_once_and_disables() {
        let mut timers = TimerRegistry::<&str>::new();
        let a = timers.create("a");
        let now = Instant::now();
        timers.schedule_at(a, true, now, 10 * MS, Duration::ZERO, "run");

        assert!(timers.fire_expired(now + 5 * MS).is_empty());
        assert_eq!(timers.fire_expired(now + 10 * MS), vec!["run"]);
        assert!(!timers.is_enabled(a));
        assert!(timers.fire_expired(now + 100 * MS).is_empty());
    }

    #[test]
    fn periodic_timer_reschedules_from_now_not_from_expiration() {
        let mut timers = TimerRegistry::<u8>::new();
        let a = timers.create("tick");
        let start = Instant::now();
        timers.schedule_at(a, true, start, 10 * MS, 10 * MS, 7);

        // Wake up very late: only one firing, next one a full period later.
        let late = start + 95 * MS;
        assert_eq!(timers.fire_expired(late), vec![7]);
        assert_eq!(timers.next_deadline(), Some(late + 10 * MS));
    }

    #[test]
    fn expired_timers_fire_in_registration_order() {
        let mut timers = TimerRegistry::<char>::new();
        let ids: Vec<_> = ['x', 'y', 'z'].iter().map(|c| timers.create(c.to_string())).collect();
        let now = Instant::now();
        // Arm in reverse order with identical deadlines.
        for (id, c) in ids.iter().zip(['x', 'y', 'z']).rev() {
            timers.schedule_at(*id, true, now, MS, Duration::ZERO, c);
        }
        assert_eq!(timers.fire_expired(now + MS), vec!['x', 'y', 'z']);
    }

    #[test]
    fn timers_armed_after_a_pass_wait_for_the_next_one() {
        let mut timers = TimerRegistry::<u8>::new();
        let a = timers.create("a");
        let b = timers.create("b");
        let now = Instant::now();
        timers.schedule_at(a, true, now, Duration::ZERO, Duration::ZERO, 1);

        let fired = timers.fire_expired(now);
        assert_eq!(fired, vec![1]);
        // "callback" arms b with zero delay; it is not part of the finished pass.
        timers.schedule_at(b, true, now, Duration::ZERO, Duration::ZERO, 2);
        assert_eq!(timers.next_deadline(), Some(now));
        assert_eq!(timers.fire_expired(now), vec![2]);
    }

    #[test]
    fn destroyed_timers_are_forgotten() {
        let mut timers = TimerRegistry::<u8>::new();
        let a = timers.create("a");
        let now = Instant::now();
        timers.schedule_at(a, true, now, MS, Duration::ZERO, 1);
        timers.destroy(a);
        assert_eq!(timers.next_deadline(), None);
        // Re-arming a destroyed timer is a logged no-op.
        timers.schedule_at(a, true, now, MS, Duration::ZERO, 1);
        assert!(timers.fire_expired(now + MS).is_empty());
    }
}
