#![forbid(unsafe_code)]

//! Rate limiting for high-frequency page signals.
//!
//! Browsers fire scroll, pointer-move, touch and key events far more often
//! than the widget needs to react. Two strategies turn those streams into
//! logical triggers without dropping the last event of a burst:
//!
//! - [`Throttle`]: trailing, at most one evaluation per interval. The first
//!   signal schedules the evaluation; later signals fold into it.
//! - [`Debounce`]: every signal restarts the delay; the action runs once the
//!   stream has been quiet for the whole delay.
//!
//! Both keep their pending state next to a [`TimerKey`] in the shared
//! [`TimerQueue`], and both must be told when their task fires.

use core::time::Duration;

use crate::timer::{TimerHandle, TimerKey, TimerQueue};

/// One animation frame.
pub const SCROLL_THROTTLE_INTERVAL: Duration = Duration::from_millis(16);

/// Quiet period before interaction counts as activity.
pub const ACTIVITY_DEBOUNCE_DELAY: Duration = Duration::from_millis(100);

/// Trailing throttle bound to one timer key.
#[derive(Debug, Clone)]
pub struct Throttle {
    key: TimerKey,
    interval: Duration,
    pending: bool,
}

impl Throttle {
    #[must_use]
    pub const fn new(key: TimerKey, interval: Duration) -> Self {
        Self {
            key,
            interval,
            pending: false,
        }
    }

    /// Record a raw signal. Returns `true` if this signal scheduled a new
    /// evaluation, `false` if it was coalesced into a pending one.
    pub fn signal(&mut self, timers: &mut TimerQueue) -> bool {
        if self.pending {
            return false;
        }
        timers.schedule(self.key, self.interval);
        self.pending = true;
        true
    }

    /// Clear the pending flag once the scheduled evaluation fires.
    pub fn fired(&mut self) {
        self.pending = false;
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    #[must_use]
    pub const fn key(&self) -> TimerKey {
        self.key
    }
}

/// Debounce bound to one timer key.
#[derive(Debug, Clone)]
pub struct Debounce {
    key: TimerKey,
    delay: Duration,
    pending: Option<TimerHandle>,
}

impl Debounce {
    #[must_use]
    pub const fn new(key: TimerKey, delay: Duration) -> Self {
        Self {
            key,
            delay,
            pending: None,
        }
    }

    /// Record a raw signal, pushing the action back by the full delay.
    pub fn signal(&mut self, timers: &mut TimerQueue) {
        if self.pending.take().is_some() {
            timers.cancel(self.key);
        }
        self.pending = Some(timers.schedule(self.key, self.delay));
    }

    /// Clear the pending handle once the action fires.
    pub fn fired(&mut self) {
        self.pending = None;
    }

    /// Drop a pending action without running it.
    pub fn cancel(&mut self, timers: &mut TimerQueue) {
        if self.pending.take().is_some() {
            timers.cancel(self.key);
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub const fn key(&self) -> TimerKey {
        self.key
    }
}
