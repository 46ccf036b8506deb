#![forbid(unsafe_code)]

//! Idle countdown for an open session.
//!
//! At most one countdown is live. Starting replaces the previous one, so
//! the timer can be restarted freely on every settled burst of activity.

use core::time::Duration;

use crate::timer::{TimerKey, TimerQueue};

#[derive(Debug, Clone)]
pub struct InactivityTimer {
    timeout: Duration,
}

impl InactivityTimer {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cancel any running countdown and start a fresh one.
    pub fn start(&self, timers: &mut TimerQueue) {
        timers.schedule(TimerKey::InactivityTimeout, self.timeout);
    }

    pub fn cancel(&self, timers: &mut TimerQueue) {
        timers.cancel(TimerKey::InactivityTimeout);
    }

    #[must_use]
    pub fn is_running(&self, timers: &TimerQueue) -> bool {
        timers.is_pending(TimerKey::InactivityTimeout)
    }

    /// When the running countdown will fire.
    #[must_use]
    pub fn deadline(&self, timers: &TimerQueue) -> Option<Duration> {
        timers.deadline_of(TimerKey::InactivityTimeout)
    }
}
