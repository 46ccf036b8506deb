#![forbid(unsafe_code)]

//! Reversible page scroll lock.
//!
//! `overflow: hidden` alone does not stop background scrolling on some
//! mobile browsers, so the lock pins the page with `position: fixed` and
//! shifts it up by the current offset. The visual position is unchanged
//! while locked, and unlocking scrolls back to where the reader was.
//!
//! Only the four inline properties in [`StyleProperty::ALL`] are captured
//! and restored; the rest of the page style is left alone.

use crate::host::{PageHost, StyleProperty};

/// State captured by [`ScrollLock::engage`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollLockSnapshot {
    pub offset: f64,
    /// Prior inline values in [`StyleProperty::ALL`] order; empty = unset.
    pub styles: [String; 4],
}

/// Engage/disengage pair. Both directions are idempotent.
#[derive(Debug, Clone, Default)]
pub struct ScrollLock {
    snapshot: Option<ScrollLockSnapshot>,
}

impl ScrollLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.snapshot.is_some()
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&ScrollLockSnapshot> {
        self.snapshot.as_ref()
    }

    /// Pin the page. A second call keeps the first snapshot.
    pub fn engage<H: PageHost>(&mut self, host: &mut H) {
        if self.snapshot.is_some() {
            return;
        }

        // Overscroll can report a negative offset.
        let offset = host.metrics().scroll_offset.max(0.0);
        let styles = StyleProperty::ALL.map(|property| host.inline_style(property));

        host.set_inline_style(StyleProperty::Position, "fixed");
        host.set_inline_style(StyleProperty::Top, &format!("-{offset}px"));
        host.set_inline_style(StyleProperty::Width, "100%");
        host.set_inline_style(StyleProperty::Overflow, "hidden");

        tracing::debug!(target: "knowbot.scroll_lock", offset, "scroll lock engaged");
        self.snapshot = Some(ScrollLockSnapshot { offset, styles });
    }

    /// Restore the captured styles and scroll offset. No-op when not engaged.
    pub fn disengage<H: PageHost>(&mut self, host: &mut H) {
        let Some(snapshot) = self.snapshot.take() else {
            return;
        };

        for (property, value) in StyleProperty::ALL.into_iter().zip(&snapshot.styles) {
            host.set_inline_style(property, value);
        }
        if snapshot.offset > 0.0 {
            host.scroll_to(snapshot.offset);
        }

        tracing::debug!(
            target: "knowbot.scroll_lock",
            offset = snapshot.offset,
            "scroll lock released"
        );
    }
}
