#![forbid(unsafe_code)]

//! Deterministic clock and keyed deferred-task queue.
//!
//! The widget never reads a real clock. The embedding host advances a
//! monotonic [`Clock`] explicitly and asks the [`TimerQueue`] for due tasks,
//! which keeps every throttle, debounce and idle countdown reproducible in
//! native tests.
//!
//! Each logical timer is identified by a [`TimerKey`]. Scheduling a key that
//! is already pending replaces the old task outright, so a superseded task
//! can never fire late.

use core::time::Duration;

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    now: Duration,
}

impl Clock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time. Going backwards is ignored.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

/// Logical deferred actions owned by the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Trailing throttled visibility evaluation after scroll/resize.
    ScrollEvaluation,
    /// Debounced interaction-liveness action.
    ActivitySettle,
    /// Idle countdown of an open session.
    InactivityTimeout,
}

/// Opaque identity of one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    key: TimerKey,
    handle: TimerHandle,
    deadline: Duration,
}

/// A task popped from the queue because its deadline passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTask {
    pub key: TimerKey,
    pub handle: TimerHandle,
    pub deadline: Duration,
}

/// Keyed queue of fire-once deferred tasks.
///
/// Holds at most one task per [`TimerKey`], so the queue never grows past
/// the number of keys.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    clock: Clock,
    tasks: Vec<ScheduledTask>,
    next_handle: u64,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Schedule `key` to fire `delay` from now, replacing any pending task
    /// with the same key.
    pub fn schedule(&mut self, key: TimerKey, delay: Duration) -> TimerHandle {
        self.cancel(key);
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.tasks.push(ScheduledTask {
            key,
            handle,
            deadline: self.clock.now().saturating_add(delay),
        });
        handle
    }

    /// Drop the pending task for `key`. Returns whether one was pending.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.key != key);
        self.tasks.len() != before
    }

    #[must_use]
    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.tasks.iter().any(|task| task.key == key)
    }

    /// Deadline of the pending task for `key`, if any.
    #[must_use]
    pub fn deadline_of(&self, key: TimerKey) -> Option<Duration> {
        self.tasks
            .iter()
            .find(|task| task.key == key)
            .map(|task| task.deadline)
    }

    /// Earliest pending deadline, for hosts that arm one platform timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.tasks.iter().map(|task| task.deadline).min()
    }

    /// Remove and return the earliest task due at or before `now`.
    ///
    /// Ties resolve in scheduling order. The clock is moved to the task's
    /// deadline so work scheduled while handling it is anchored there.
    pub fn pop_due(&mut self, now: Duration) -> Option<DueTask> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.deadline <= now)
            .min_by_key(|(_, task)| (task.deadline, task.handle))
            .map(|(index, _)| index)?;
        let task = self.tasks.swap_remove(index);
        self.clock.set(task.deadline);
        Some(DueTask {
            key: task.key,
            handle: task.handle,
            deadline: task.deadline,
        })
    }
}
