#![forbid(unsafe_code)]

//! Pure visibility decision for the widget chrome.
//!
//! The widget counts as *active* (launcher rendered, chrome styled as
//! visible) when the session is open, or when the page has been scrolled far
//! enough / is tall enough and the current path is not excluded.
//!
//! Nothing here touches the page; the session controller owns the write.

use crate::error::ConfigError;

/// Trailing marker that turns an exclusion entry into a prefix match.
pub const WILDCARD: char = '*';

/// Page measurements sampled from the host.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageMetrics {
    /// Vertical scroll offset in CSS pixels.
    pub scroll_offset: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

/// A single path exclusion rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches one path exactly.
    Exact(String),
    /// Matches every path starting with the prefix (`/docs/*` → `/docs/`).
    Prefix(String),
}

impl PathPattern {
    /// Parse an exclusion entry such as `/pricing` or `/docs/*`.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidExcludePath {
            pattern: entry.to_owned(),
            reason: reason.to_owned(),
        };

        if entry.is_empty() {
            return Err(invalid("entry is empty"));
        }
        if !entry.starts_with('/') {
            return Err(invalid("entry must start with '/'"));
        }
        match entry.find(WILDCARD) {
            None => Ok(Self::Exact(entry.to_owned())),
            Some(pos) if pos == entry.len() - WILDCARD.len_utf8() => {
                Ok(Self::Prefix(entry[..pos].to_owned()))
            }
            Some(_) => Err(invalid("'*' is only allowed as the final character")),
        }
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// Thresholds and exclusions taken from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityRules<'a> {
    pub scroll_distance: f64,
    pub min_viewport_height: f64,
    pub exclusions: &'a [PathPattern],
}

/// `scroll >= scroll_distance || viewport_height >= min_viewport_height`.
#[must_use]
pub fn visibility_condition(metrics: PageMetrics, rules: &VisibilityRules<'_>) -> bool {
    metrics.scroll_offset >= rules.scroll_distance
        || metrics.viewport_height >= rules.min_viewport_height
}

#[must_use]
pub fn path_excluded(path: &str, exclusions: &[PathPattern]) -> bool {
    exclusions.iter().any(|pattern| pattern.matches(path))
}

/// Whether the widget chrome should be marked active.
#[must_use]
pub fn is_active(
    is_open: bool,
    metrics: PageMetrics,
    path: &str,
    rules: &VisibilityRules<'_>,
) -> bool {
    is_open || (visibility_condition(metrics, rules) && !path_excluded(path, rules.exclusions))
}
