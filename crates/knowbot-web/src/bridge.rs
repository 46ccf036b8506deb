#![forbid(unsafe_code)]

//! Browser-independent glue between DOM events and the session controller.
//!
//! The wasm module listens for DOM events and translates them with
//! [`page_signal`] / [`apply_signal`]; timer arming uses
//! [`timeout_delay_ms`]. Keeping this here lets the mapping be tested
//! against `HeadlessPage` without a browser.

use core::time::Duration;

use knowbot_core::config::check_address;
use knowbot_core::{ActivityKind, PageHost, SessionController};

/// Events listened for on `window`.
pub const WINDOW_EVENTS: [&str; 4] = ["scroll", "resize", "hashchange", "popstate"];

/// Events listened for on `document`.
pub const DOCUMENT_EVENTS: [&str; 3] = ["pointermove", "touchstart", "keydown"];

/// Listeners that never call `preventDefault`.
pub const PASSIVE_EVENTS: [&str; 3] = ["scroll", "pointermove", "touchstart"];

/// Page-level signal a DOM event stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSignal {
    Scroll,
    Resize,
    Activity(ActivityKind),
    Navigation,
}

#[must_use]
pub fn page_signal(event_type: &str) -> Option<PageSignal> {
    match event_type {
        "scroll" => Some(PageSignal::Scroll),
        "resize" => Some(PageSignal::Resize),
        "pointermove" => Some(PageSignal::Activity(ActivityKind::PointerMove)),
        "touchstart" => Some(PageSignal::Activity(ActivityKind::TouchStart)),
        "keydown" => Some(PageSignal::Activity(ActivityKind::KeyDown)),
        "hashchange" | "popstate" => Some(PageSignal::Navigation),
        _ => None,
    }
}

/// Forward `signal` to the controller. `hash` is the current location hash,
/// read only for navigation.
pub fn apply_signal<H: PageHost>(
    session: &mut SessionController<H>,
    signal: PageSignal,
    hash: impl FnOnce() -> String,
) {
    match signal {
        PageSignal::Scroll => session.on_scroll(),
        PageSignal::Resize => session.on_resize(),
        PageSignal::Activity(kind) => session.on_activity(kind),
        PageSignal::Navigation => session.on_navigation(&hash()),
    }
}

/// Keys that activate a focused `role="button"` element.
#[must_use]
pub fn is_activation_key(key: &str) -> bool {
    matches!(key, "Enter" | " " | "Spacebar")
}

/// Deep-link address from a launcher's `data-knowbot-url` attribute.
///
/// Blank values fall back to the configured address; unsupported ones are
/// logged and fall back too.
#[must_use]
pub fn deep_link(attribute: Option<&str>) -> Option<String> {
    let address = attribute.map(str::trim).filter(|value| !value.is_empty())?;
    match check_address(address) {
        Ok(()) => Some(address.to_owned()),
        Err(err) => {
            tracing::warn!(
                target: "knowbot.web",
                address,
                error = %err,
                "launcher deep link ignored"
            );
            None
        }
    }
}

/// `setTimeout` delay for a deadline, rounded up so the timer never fires
/// before the deadline is due.
#[must_use]
pub fn timeout_delay_ms(deadline: Duration, now: Duration) -> i32 {
    let micros = deadline.saturating_sub(now).as_micros();
    i32::try_from(micros.div_ceil(1_000)).unwrap_or(i32::MAX)
}
