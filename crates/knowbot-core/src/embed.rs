#![forbid(unsafe_code)]

//! Lifecycle of the embedded content surface (the iframe).
//!
//! The surface is created lazily on first open and then reused for the rest
//! of the page lifetime. Resetting points it at an inert placeholder instead
//! of destroying it, so the next open only has to swap the address back.

use crate::host::PageHost;

/// Inert address loaded into a reset surface.
pub const BLANK_ADDRESS: &str = "about:blank";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Surface {
    address: String,
    hidden: bool,
}

/// Handle over the page's content surface.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedContent {
    surface: Option<Surface>,
}

impl EmbeddedContent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.surface.is_some()
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.surface.as_ref().map(|surface| surface.address.as_str())
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.surface.as_ref().is_none_or(|surface| surface.hidden)
    }

    /// `true` while a surface exists and holds real content.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.address().is_some_and(|address| address != BLANK_ADDRESS)
    }

    /// Make sure a surface exists and points at `address`. A refused
    /// creation leaves no surface behind, so the next call tries again.
    pub fn ensure<H: PageHost>(&mut self, host: &mut H, address: &str) {
        if let Some(surface) = &mut self.surface {
            if surface.address != address {
                host.set_content_address(address);
                tracing::debug!(target: "knowbot.embed", address, "content address updated");
                surface.address = address.to_owned();
            }
            return;
        }

        if !host.create_content_surface() {
            tracing::warn!(target: "knowbot.embed", address, "content surface could not be created");
            return;
        }
        host.set_content_hidden(true);
        host.set_content_address(address);
        tracing::debug!(target: "knowbot.embed", address, "content surface created");
        self.surface = Some(Surface {
            address: address.to_owned(),
            hidden: true,
        });
    }

    /// Point an existing surface at [`BLANK_ADDRESS`]. The surface is kept.
    pub fn reset<H: PageHost>(&mut self, host: &mut H) {
        let Some(surface) = &mut self.surface else {
            return;
        };
        if surface.address == BLANK_ADDRESS {
            return;
        }
        host.set_content_address(BLANK_ADDRESS);
        surface.address = BLANK_ADDRESS.to_owned();
        tracing::debug!(target: "knowbot.embed", "content reset");
    }

    /// Mirror the session state onto the surface's accessibility flag.
    pub fn set_hidden<H: PageHost>(&mut self, host: &mut H, hidden: bool) {
        let Some(surface) = &mut self.surface else {
            return;
        };
        if surface.hidden != hidden {
            host.set_content_hidden(hidden);
            surface.hidden = hidden;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessPage, HeadlessSurface};

    use pretty_assertions::assert_eq;

    const URL: &str = "https://bot.example.org/chat";

    #[test]
    fn ensure_creates_once_and_starts_hidden() {
        let mut page = HeadlessPage::default();
        let mut content = EmbeddedContent::new();

        content.ensure(&mut page, URL);
        content.ensure(&mut page, URL);

        assert_eq!(page.surfaces_created, 1);
        assert_eq!(page.address_log, vec![URL.to_owned()]);
        assert_eq!(
            page.surface,
            Some(HeadlessSurface {
                address: URL.into(),
                hidden: true,
            })
        );
        assert!(content.is_hidden());
        assert!(content.is_loaded());
    }

    #[test]
    fn reset_blanks_but_keeps_the_surface() {
        let mut page = HeadlessPage::default();
        let mut content = EmbeddedContent::new();

        content.ensure(&mut page, URL);
        content.reset(&mut page);
        content.reset(&mut page);

        assert!(content.exists());
        assert!(!content.is_loaded());
        assert_eq!(content.address(), Some(BLANK_ADDRESS));
        assert_eq!(page.address_log, vec![URL.to_owned(), BLANK_ADDRESS.to_owned()]);

        content.ensure(&mut page, URL);
        assert_eq!(page.surfaces_created, 1);
        assert_eq!(content.address(), Some(URL));
    }

    #[test]
    fn reset_without_a_surface_is_a_no_op() {
        let mut page = HeadlessPage::default();
        let mut content = EmbeddedContent::new();

        content.reset(&mut page);
        content.set_hidden(&mut page, false);

        assert!(!content.exists());
        assert!(content.is_hidden());
        assert_eq!(page.surfaces_created, 0);
    }

    #[test]
    fn refused_creation_is_retried_on_the_next_ensure() {
        let mut page = HeadlessPage {
            reject_surfaces: true,
            ..HeadlessPage::default()
        };
        let mut content = EmbeddedContent::new();

        content.ensure(&mut page, URL);
        assert!(!content.exists());
        assert!(page.address_log.is_empty());

        page.reject_surfaces = false;
        content.ensure(&mut page, URL);

        assert!(content.exists());
        assert_eq!(page.surfaces_created, 1);
        assert_eq!(page.address_log, vec![URL.to_owned()]);
    }

    #[test]
    fn hidden_flag_is_independent_of_the_address() {
        let mut page = HeadlessPage::default();
        let mut content = EmbeddedContent::new();

        content.ensure(&mut page, URL);
        content.set_hidden(&mut page, false);
        content.reset(&mut page);

        assert!(!content.is_hidden());
        assert_eq!(page.surface.as_ref().map(|s| s.hidden), Some(false));
    }
}
