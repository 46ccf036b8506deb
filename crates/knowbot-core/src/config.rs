#![forbid(unsafe_code)]

//! Widget options as data.
//!
//! The embedding page hands the widget a plain options object. It is read
//! here once, merged over the defaults, validated, and frozen into a
//! [`WidgetConfig`] that the session controller owns for the page lifetime.
//!
//! # Loading
//!
//! ```
//! use knowbot_core::config::WidgetConfig;
//!
//! let parsed = WidgetConfig::from_json_str(
//!     r#"{ "url": "https://bot.example.org/chat", "excludePaths": ["/checkout/*"] }"#,
//! )
//! .expect("options should be valid");
//! assert!(parsed.warnings.is_empty());
//! assert_eq!(parsed.config.launcher_label.as_deref(), Some("Ask Me !"));
//! ```
//!
//! # Defaults
//!
//! Every option has a default; only `url` is required. Keys the widget does
//! not know are reported as [`ConfigWarning::UnknownKey`] and ignored. A
//! wrong-typed or out-of-range value fails the whole load.

use core::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigWarning, Result};
use crate::visibility::{PathPattern, VisibilityRules};

pub const DEFAULT_LAUNCHER_SELECTOR: &str = ".knowbot";
pub const DEFAULT_LAUNCHER_LABEL: &str = "Ask Me !";
pub const DEFAULT_LAUNCHER_ARIA_LABEL: &str = "Ask Knowbot a question";
pub const DEFAULT_CLOSE_TEXT: &str = "Close";
pub const DEFAULT_CLOSE_ARIA_LABEL: &str = "Close Knowbot";
pub const DEFAULT_MIN_VIEWPORT_HEIGHT: f64 = 600.0;
pub const DEFAULT_SCROLL_DISTANCE: f64 = 150.0;
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_MOBILE_BREAKPOINT: f64 = 768.0;
pub const DEFAULT_OPEN_ANCHOR: &str = "#knowbot";

/// Option keys understood by [`WidgetConfig::from_json_value`].
pub const KNOWN_OPTIONS: &[&str] = &[
    "url",
    "customButton",
    "button",
    "buttonAriaLabel",
    "buttonTextColor",
    "buttonTextColorHover",
    "buttonBgColor",
    "buttonBgColorHover",
    "buttonWindowMinHeight",
    "buttonWindowScrollDistance",
    "closeText",
    "closeAriaLabel",
    "excludePaths",
    "inactivityTimeout",
    "mobileScrollLock",
    "mobileBreakpoint",
    "iframeResetOnClose",
    "openAnchor",
    "debug",
];

/// Optional launcher color overrides. `None` keeps the stylesheet default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LauncherTheme {
    pub text_color: Option<String>,
    pub text_color_hover: Option<String>,
    pub bg_color: Option<String>,
    pub bg_color_hover: Option<String>,
}

impl LauncherTheme {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text_color.is_none()
            && self.text_color_hover.is_none()
            && self.bg_color.is_none()
            && self.bg_color_hover.is_none()
    }
}

/// Validated, immutable widget configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    /// Address loaded into the embedded content surface.
    pub url: String,
    /// Selector for extra in-page elements that also open the widget.
    pub launcher_selector: String,
    /// Floating launcher label; `None` disables the floating launcher.
    pub launcher_label: Option<String>,
    pub launcher_aria_label: String,
    pub close_text: String,
    pub close_aria_label: String,
    pub theme: LauncherTheme,
    /// Viewport height at which the widget is active without scrolling.
    pub min_viewport_height: f64,
    /// Scroll offset at which the widget becomes active.
    pub scroll_distance: f64,
    pub exclude_paths: Vec<PathPattern>,
    pub inactivity_timeout: Duration,
    /// Pin the page while open on narrow viewports.
    pub mobile_scroll_lock: bool,
    /// Widest viewport (CSS px) still treated as mobile.
    pub mobile_breakpoint: f64,
    /// Blank the embedded content on every close, not only on idle timeout.
    pub reset_on_close: bool,
    /// Location hash that opens the widget, e.g. `#knowbot`.
    pub open_anchor: Option<String>,
    pub debug: bool,
}

/// A loaded configuration plus the non-fatal findings gathered on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedConfig {
    pub config: WidgetConfig,
    pub warnings: Vec<ConfigWarning>,
}

impl WidgetConfig {
    /// Defaults for every option, targeting `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            launcher_selector: DEFAULT_LAUNCHER_SELECTOR.to_owned(),
            launcher_label: Some(DEFAULT_LAUNCHER_LABEL.to_owned()),
            launcher_aria_label: DEFAULT_LAUNCHER_ARIA_LABEL.to_owned(),
            close_text: DEFAULT_CLOSE_TEXT.to_owned(),
            close_aria_label: DEFAULT_CLOSE_ARIA_LABEL.to_owned(),
            theme: LauncherTheme::default(),
            min_viewport_height: DEFAULT_MIN_VIEWPORT_HEIGHT,
            scroll_distance: DEFAULT_SCROLL_DISTANCE,
            exclude_paths: Vec::new(),
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            mobile_scroll_lock: true,
            mobile_breakpoint: DEFAULT_MOBILE_BREAKPOINT,
            reset_on_close: false,
            open_anchor: Some(DEFAULT_OPEN_ANCHOR.to_owned()),
            debug: false,
        }
    }

    /// Load from a JSON options string.
    pub fn from_json_str(s: &str) -> Result<ParsedConfig> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_json_value(value)
    }

    /// Load from an already-parsed JSON options object.
    pub fn from_json_value(value: Value) -> Result<ParsedConfig> {
        let Value::Object(map) = value else {
            return Err(ConfigError::NotAnObject);
        };
        let warnings = unknown_keys(&map);
        for warning in &warnings {
            tracing::warn!(target: "knowbot.config", %warning, "ignoring option");
        }

        let raw: RawOptions = serde_json::from_value(Value::Object(map))?;
        let config = raw.into_config()?;
        config.validate()?;
        tracing::debug!(
            target: "knowbot.config",
            url = %config.url,
            exclusions = config.exclude_paths.len(),
            "options loaded"
        );
        Ok(ParsedConfig { config, warnings })
    }

    /// Check every value is usable. Called again by the session controller
    /// so hand-built configs get the same guarantees as parsed ones.
    pub fn validate(&self) -> Result<()> {
        check_address(&self.url)?;

        for (field, value) in [
            ("buttonWindowMinHeight", self.min_viewport_height),
            ("buttonWindowScrollDistance", self.scroll_distance),
            ("mobileBreakpoint", self.mobile_breakpoint),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be a finite number >= 0, got {value}"),
                ));
            }
        }

        if self.inactivity_timeout.is_zero() {
            return Err(ConfigError::invalid("inactivityTimeout", "must be > 0"));
        }

        if self.launcher_selector.trim().is_empty() {
            return Err(ConfigError::invalid("customButton", "selector is empty"));
        }

        if let Some(anchor) = &self.open_anchor {
            if !anchor.starts_with('#') || anchor.len() < 2 {
                return Err(ConfigError::invalid(
                    "openAnchor",
                    format!("must look like `#name`, got {anchor:?}"),
                ));
            }
        }

        Ok(())
    }

    /// Thresholds and exclusions for the visibility evaluator.
    #[must_use]
    pub fn visibility_rules(&self) -> VisibilityRules<'_> {
        VisibilityRules {
            scroll_distance: self.scroll_distance,
            min_viewport_height: self.min_viewport_height,
            exclusions: &self.exclude_paths,
        }
    }
}

/// Accept absolute http(s) or root-relative addresses for embedded content.
pub fn check_address(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(ConfigError::MissingUrl);
    }
    let allowed = url.starts_with("https://")
        || url.starts_with("http://")
        || (url.starts_with('/') && !url.starts_with("//"));
    if !allowed || url.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidUrl {
            url: url.to_owned(),
        });
    }
    Ok(())
}

fn unknown_keys(map: &Map<String, Value>) -> Vec<ConfigWarning> {
    map.keys()
        .filter(|key| !KNOWN_OPTIONS.contains(&key.as_str()))
        .map(|key| ConfigWarning::UnknownKey { key: key.clone() })
        .collect()
}

/// A string option that can be switched off with `false`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TextOrOff {
    Text(String),
    Flag(bool),
}

impl TextOrOff {
    fn text(value: &str) -> Self {
        Self::Text(value.to_owned())
    }

    fn into_option(self, field: &'static str) -> Result<Option<String>> {
        match self {
            Self::Text(text) => Ok(Some(text)),
            Self::Flag(false) => Ok(None),
            Self::Flag(true) => Err(ConfigError::invalid(field, "expected a string or false")),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawOptions {
    url: Option<String>,
    custom_button: String,
    button: TextOrOff,
    button_aria_label: String,
    button_text_color: TextOrOff,
    button_text_color_hover: TextOrOff,
    button_bg_color: TextOrOff,
    button_bg_color_hover: TextOrOff,
    button_window_min_height: f64,
    button_window_scroll_distance: f64,
    close_text: String,
    close_aria_label: String,
    exclude_paths: Vec<String>,
    /// Milliseconds.
    inactivity_timeout: u64,
    mobile_scroll_lock: bool,
    mobile_breakpoint: f64,
    iframe_reset_on_close: bool,
    open_anchor: TextOrOff,
    debug: bool,
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            url: None,
            custom_button: DEFAULT_LAUNCHER_SELECTOR.to_owned(),
            button: TextOrOff::text(DEFAULT_LAUNCHER_LABEL),
            button_aria_label: DEFAULT_LAUNCHER_ARIA_LABEL.to_owned(),
            button_text_color: TextOrOff::Flag(false),
            button_text_color_hover: TextOrOff::Flag(false),
            button_bg_color: TextOrOff::Flag(false),
            button_bg_color_hover: TextOrOff::Flag(false),
            button_window_min_height: DEFAULT_MIN_VIEWPORT_HEIGHT,
            button_window_scroll_distance: DEFAULT_SCROLL_DISTANCE,
            close_text: DEFAULT_CLOSE_TEXT.to_owned(),
            close_aria_label: DEFAULT_CLOSE_ARIA_LABEL.to_owned(),
            exclude_paths: Vec::new(),
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT.as_millis() as u64,
            mobile_scroll_lock: true,
            mobile_breakpoint: DEFAULT_MOBILE_BREAKPOINT,
            iframe_reset_on_close: false,
            open_anchor: TextOrOff::text(DEFAULT_OPEN_ANCHOR),
            debug: false,
        }
    }
}

impl RawOptions {
    fn into_config(self) -> Result<WidgetConfig> {
        let url = self.url.ok_or(ConfigError::MissingUrl)?;
        let exclude_paths = self
            .exclude_paths
            .iter()
            .map(|entry| PathPattern::parse(entry))
            .collect::<Result<Vec<_>>>()?;

        Ok(WidgetConfig {
            url,
            launcher_selector: self.custom_button,
            launcher_label: self.button.into_option("button")?,
            launcher_aria_label: self.button_aria_label,
            close_text: self.close_text,
            close_aria_label: self.close_aria_label,
            theme: LauncherTheme {
                text_color: self.button_text_color.into_option("buttonTextColor")?,
                text_color_hover: self
                    .button_text_color_hover
                    .into_option("buttonTextColorHover")?,
                bg_color: self.button_bg_color.into_option("buttonBgColor")?,
                bg_color_hover: self.button_bg_color_hover.into_option("buttonBgColorHover")?,
            },
            min_viewport_height: self.button_window_min_height,
            scroll_distance: self.button_window_scroll_distance,
            exclude_paths,
            inactivity_timeout: Duration::from_millis(self.inactivity_timeout),
            mobile_scroll_lock: self.mobile_scroll_lock,
            mobile_breakpoint: self.mobile_breakpoint,
            reset_on_close: self.iframe_reset_on_close,
            open_anchor: self.open_anchor.into_option("openAnchor")?,
            debug: self.debug,
        })
    }
}
