#![forbid(unsafe_code)]

//! Session controller: the widget's open/closed state machine.
//!
//! [`SessionController`] is the single writer of widget state on the page.
//! It owns the configuration, the page host, and every collaborator:
//!
//! - the scroll [`Throttle`] and activity [`Debounce`] in front of it,
//! - the pure visibility evaluator that decides the active class,
//! - the [`ScrollLock`] engaged while open on narrow viewports,
//! - the lazily created [`EmbeddedContent`] surface,
//! - the [`InactivityTimer`] that force-closes an abandoned session.
//!
//! # Driving
//!
//! The host forwards raw signals (`on_scroll`, `on_resize`, `on_activity`,
//! `on_navigation`), calls [`open`](SessionController::open) /
//! [`close`](SessionController::close) on user intent, and advances time
//! with [`advance_to`](SessionController::advance_to). A browser host arms a
//! single platform timer for [`next_deadline`](SessionController::next_deadline).
//!
//! ```
//! use core::time::Duration;
//! use knowbot_core::config::WidgetConfig;
//! use knowbot_core::host::HeadlessPage;
//! use knowbot_core::session::SessionController;
//!
//! let mut config = WidgetConfig::new("https://bot.example.org/chat");
//! config.inactivity_timeout = Duration::from_secs(60);
//! let mut session = SessionController::new(config, HeadlessPage::default()).unwrap();
//!
//! session.open();
//! assert!(session.is_open() && session.is_active());
//!
//! session.advance(Duration::from_secs(61));
//! assert!(!session.is_open());
//! assert!(!session.content().is_loaded());
//! ```
//!
//! # Idle close versus user close
//!
//! A user close only blanks the content when `reset_on_close` is set. An
//! idle close always blanks it first: the session is treated as abandoned.

use core::time::Duration;

use crate::config::WidgetConfig;
use crate::embed::EmbeddedContent;
use crate::error::Result;
use crate::host::{ACTIVE_CLASS, OPEN_CLASS, PageHost, WidgetElement};
use crate::inactivity::InactivityTimer;
use crate::rate_limit::{ACTIVITY_DEBOUNCE_DELAY, Debounce, SCROLL_THROTTLE_INTERVAL, Throttle};
use crate::scroll_lock::ScrollLock;
use crate::timer::{TimerKey, TimerQueue};
use crate::visibility;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Closed,
    Open,
}

/// Interaction signals that count as user liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    PointerMove,
    TouchStart,
    KeyDown,
}

/// Why a session closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Close control, host API, or any other explicit request.
    Requested,
    /// The inactivity countdown fired.
    IdleTimeout,
}

impl CloseReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::IdleTimeout => "idle_timeout",
        }
    }
}

/// The widget's session and visibility state machine.
#[derive(Debug)]
pub struct SessionController<H: PageHost> {
    config: WidgetConfig,
    host: H,
    state: SessionState,
    timers: TimerQueue,
    scroll_throttle: Throttle,
    activity_debounce: Debounce,
    inactivity: InactivityTimer,
    scroll_lock: ScrollLock,
    content: EmbeddedContent,
    /// Last value written to the page's active class.
    applied_active: Option<bool>,
}

impl<H: PageHost> SessionController<H> {
    /// Attach to a page whose widget markup is already in place.
    ///
    /// Fails without touching the page if `config` is invalid. On success
    /// the widget elements are put in their closed state and the active class
    /// is evaluated once.
    pub fn new(config: WidgetConfig, host: H) -> Result<Self> {
        config.validate()?;

        let inactivity = InactivityTimer::new(config.inactivity_timeout);
        let mut controller = Self {
            config,
            host,
            state: SessionState::Closed,
            timers: TimerQueue::new(),
            scroll_throttle: Throttle::new(TimerKey::ScrollEvaluation, SCROLL_THROTTLE_INTERVAL),
            activity_debounce: Debounce::new(TimerKey::ActivitySettle, ACTIVITY_DEBOUNCE_DELAY),
            inactivity,
            scroll_lock: ScrollLock::new(),
            content: EmbeddedContent::new(),
            applied_active: None,
        };

        controller.host.set_element_visible(WidgetElement::Overlay, false);
        controller
            .host
            .set_element_visible(WidgetElement::CloseControl, false);
        if controller.has_launcher() {
            controller.host.set_element_visible(WidgetElement::Launcher, true);
        }
        controller.recompute_active();

        tracing::debug!(
            target: "knowbot.session",
            url = %controller.config.url,
            is_active = controller.is_active(),
            "widget mounted"
        );
        Ok(controller)
    }

    #[must_use]
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable page access for hosts that update metrics in place.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn into_host(self) -> H {
        self.host
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Last active value written to the page.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.applied_active == Some(true)
    }

    #[must_use]
    pub fn content(&self) -> &EmbeddedContent {
        &self.content
    }

    #[must_use]
    pub fn scroll_lock(&self) -> &ScrollLock {
        &self.scroll_lock
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// When the running idle countdown fires, if the session is open.
    #[must_use]
    pub fn inactivity_deadline(&self) -> Option<Duration> {
        self.inactivity.deadline(&self.timers)
    }

    /// Earliest pending deferred action, for hosts that arm a real timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Open the session on the configured address.
    pub fn open(&mut self) {
        let address = self.config.url.clone();
        self.open_at(&address);
    }

    /// Open the session on `address`.
    ///
    /// While already open this only re-points the content surface, so a
    /// repeated open with the same address changes nothing.
    pub fn open_at(&mut self, address: &str) {
        if self.is_open() {
            self.content.ensure(&mut self.host, address);
            return;
        }

        self.state = SessionState::Open;
        self.host.set_page_class(OPEN_CLASS, true);
        self.content.ensure(&mut self.host, address);
        self.content.set_hidden(&mut self.host, false);
        self.host.set_element_visible(WidgetElement::Overlay, true);
        self.host.set_element_visible(WidgetElement::CloseControl, true);
        if self.has_launcher() {
            self.host.set_element_visible(WidgetElement::Launcher, false);
        }
        if self.scroll_lock_applies() {
            self.scroll_lock.engage(&mut self.host);
        }
        self.inactivity.start(&mut self.timers);
        self.recompute_active();

        tracing::info!(
            target: "knowbot.session",
            address,
            scroll_locked = self.scroll_lock.is_engaged(),
            "session opened"
        );
    }

    /// Close the session. No-op while closed.
    pub fn close(&mut self) {
        self.close_with(CloseReason::Requested);
    }

    /// Scroll signal; evaluation is throttled to one per frame.
    pub fn on_scroll(&mut self) {
        self.scroll_throttle.signal(&mut self.timers);
    }

    /// Viewport resize; shares the scroll throttle since it feeds the same
    /// evaluation.
    pub fn on_resize(&mut self) {
        self.scroll_throttle.signal(&mut self.timers);
    }

    /// Pointer, touch or key input; debounced into one liveness action.
    pub fn on_activity(&mut self, kind: ActivityKind) {
        tracing::trace!(target: "knowbot.session", ?kind, "activity");
        self.activity_debounce.signal(&mut self.timers);
    }

    /// Location change. Path exclusion is re-evaluated immediately, and a
    /// hash equal to the configured open anchor opens the session.
    pub fn on_navigation(&mut self, hash: &str) {
        self.recompute_active();
        let opens = self
            .config
            .open_anchor
            .as_deref()
            .is_some_and(|anchor| anchor == hash);
        if opens {
            self.open();
        }
    }

    /// Advance the clock to `now`, running every deferred action that falls
    /// due, each at its own deadline.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some(task) = self.timers.pop_due(now) {
            self.fire(task.key);
        }
        self.timers.clock_mut().set(now);
    }

    pub fn advance(&mut self, dt: Duration) {
        let now = self.timers.now().saturating_add(dt);
        self.advance_to(now);
    }

    fn fire(&mut self, key: TimerKey) {
        match key {
            TimerKey::ScrollEvaluation => {
                self.scroll_throttle.fired();
                self.recompute_active();
            }
            TimerKey::ActivitySettle => {
                self.activity_debounce.fired();
                if self.is_open() {
                    self.inactivity.start(&mut self.timers);
                }
            }
            TimerKey::InactivityTimeout => {
                if !self.is_open() {
                    return;
                }
                // Input inside the debounce window predates the deadline.
                if self.activity_debounce.is_pending() {
                    tracing::debug!(
                        target: "knowbot.session",
                        "idle deadline reached with activity pending; countdown restarted"
                    );
                    self.inactivity.start(&mut self.timers);
                } else {
                    self.content.reset(&mut self.host);
                    self.close_with(CloseReason::IdleTimeout);
                }
            }
        }
    }

    fn close_with(&mut self, reason: CloseReason) {
        if !self.is_open() {
            return;
        }

        self.state = SessionState::Closed;
        self.host.set_page_class(OPEN_CLASS, false);
        self.content.set_hidden(&mut self.host, true);
        self.host.set_element_visible(WidgetElement::CloseControl, false);
        self.host.set_element_visible(WidgetElement::Overlay, false);
        if self.has_launcher() {
            self.host.set_element_visible(WidgetElement::Launcher, true);
        }
        self.scroll_lock.disengage(&mut self.host);
        if reason != CloseReason::IdleTimeout {
            self.inactivity.cancel(&mut self.timers);
        }
        self.activity_debounce.cancel(&mut self.timers);
        self.recompute_active();
        if self.config.reset_on_close {
            self.content.reset(&mut self.host);
        }

        tracing::info!(
            target: "knowbot.session",
            reason = reason.as_str(),
            content_loaded = self.content.is_loaded(),
            "session closed"
        );
    }

    fn recompute_active(&mut self) {
        let metrics = self.host.metrics();
        let path = self.host.path();
        let active = visibility::is_active(
            self.is_open(),
            metrics,
            &path,
            &self.config.visibility_rules(),
        );
        if self.applied_active == Some(active) {
            return;
        }
        self.host.set_page_class(ACTIVE_CLASS, active);
        self.applied_active = Some(active);
        tracing::debug!(
            target: "knowbot.session",
            is_active = active,
            is_open = self.is_open(),
            scroll_offset = metrics.scroll_offset,
            path = %path,
            "active state changed"
        );
    }

    fn has_launcher(&self) -> bool {
        self.config.launcher_label.is_some()
    }

    fn scroll_lock_applies(&self) -> bool {
        self.config.mobile_scroll_lock
            && self.host.metrics().viewport_width <= self.config.mobile_breakpoint
    }
}
