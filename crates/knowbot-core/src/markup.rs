#![forbid(unsafe_code)]

//! Widget markup rendered from the configuration.
//!
//! Pure string rendering: the host inserts the result at the end of the
//! page body and then looks the elements up by id. Every configured text
//! ends up HTML-escaped.

use std::fmt::Write as _;

use v_htmlescape::escape;

use crate::config::{LauncherTheme, WidgetConfig};

pub const LAUNCHER_ID: &str = "knowbot-button";
pub const CLOSE_CONTROL_ID: &str = "knowbot-close";
pub const CONTENT_WRAPPER_ID: &str = "knowbot-iframe-wrapper";
pub const CONTENT_SURFACE_ID: &str = "knowbot-iframe";
pub const CONTAINER_ID: &str = "knowbot-container";
pub const THEME_STYLE_ID: &str = "knowbot-theme";

/// Attribute on extra launchers carrying a deep-link address.
pub const LAUNCHER_ADDRESS_ATTRIBUTE: &str = "data-knowbot-url";

const CLOSE_ICON_PATH: &str = "M10.5859 12L2.79297 4.20706L4.20718 2.79285L12.0001 10.5857L19.793 2.79285L21.2072 4.20706L13.4143 12L21.2072 19.7928L19.793 21.2071L12.0001 13.4142L4.20718 21.2071L2.79297 19.7928L10.5859 12Z";

/// Launcher (when enabled), overlay container, content wrapper and close
/// control, ready for `insertAdjacentHTML("beforeend", …)`.
#[must_use]
pub fn render_widget(config: &WidgetConfig) -> String {
    let mut html = String::new();

    if let Some(label) = &config.launcher_label {
        let _ = write!(
            html,
            r#"<knowbot-button id="{LAUNCHER_ID}" role="button" tabindex="0" aria-label="{aria}"><span>{label}</span></knowbot-button>"#,
            aria = escape(&config.launcher_aria_label),
            label = escape(label),
        );
    }

    let _ = write!(
        html,
        concat!(
            r#"<div id="{container}">"#,
            r#"<div id="{wrapper}" style="display: none">"#,
            r#"<knowbot-button id="{close}" role="button" tabindex="0" style="display: none" aria-label="{aria}">"#,
            r#"<span class="knowbot-close-text">{text}</span>"#,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="currentColor" aria-hidden="true"><path d="{icon}"></path></svg>"#,
            r#"</knowbot-button>"#,
            r#"</div>"#,
            r#"</div>"#,
        ),
        container = CONTAINER_ID,
        wrapper = CONTENT_WRAPPER_ID,
        close = CLOSE_CONTROL_ID,
        aria = escape(&config.close_aria_label),
        text = escape(&config.close_text),
        icon = CLOSE_ICON_PATH,
    );

    html
}

/// `<style>` block for the configured launcher colors, if any are set.
#[must_use]
pub fn render_theme(theme: &LauncherTheme) -> Option<String> {
    if theme.is_empty() {
        return None;
    }

    let mut css = String::new();
    let mut rule = |selector: &str, declarations: &[(&str, &Option<String>)]| {
        let set: Vec<_> = declarations
            .iter()
            .filter_map(|(property, value)| value.as_deref().map(|v| (*property, v)))
            .collect();
        if set.is_empty() {
            return;
        }
        let _ = write!(css, "{selector}{{");
        for (property, value) in set {
            let _ = write!(css, "{property}:{};", sanitize_css_value(value));
        }
        css.push('}');
    };

    let launcher = format!("#{LAUNCHER_ID}");
    let hover = format!("#{LAUNCHER_ID}:hover,#{LAUNCHER_ID}:focus");
    rule(
        &launcher,
        &[
            ("color", &theme.text_color),
            ("background-color", &theme.bg_color),
        ],
    );
    rule(
        &hover,
        &[
            ("color", &theme.text_color_hover),
            ("background-color", &theme.bg_color_hover),
        ],
    );

    Some(format!(r#"<style id="{THEME_STYLE_ID}">{css}</style>"#))
}

/// Keep a configured color from closing the declaration or the style block.
fn sanitize_css_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>' | '"' | '\\'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn default_markup_has_launcher_and_hidden_close_control() {
        let html = render_widget(&WidgetConfig::new("/chat"));

        assert!(html.starts_with(r#"<knowbot-button id="knowbot-button" role="button""#));
        assert!(html.contains(r#"aria-label="Ask Knowbot a question""#));
        assert!(html.contains("<span>Ask Me !</span>"));
        assert!(html.contains(
            r#"<knowbot-button id="knowbot-close" role="button" tabindex="0" style="display: none" aria-label="Close Knowbot">"#
        ));
        assert!(html.contains(r#"<div id="knowbot-iframe-wrapper" style="display: none">"#));
        assert!(html.ends_with("</div></div>"));
    }

    #[test]
    fn disabled_launcher_is_omitted() {
        let mut config = WidgetConfig::new("/chat");
        config.launcher_label = None;
        let html = render_widget(&config);

        assert!(!html.contains(r#"id="knowbot-button""#));
        assert!(html.starts_with(r#"<div id="knowbot-container">"#));
    }

    #[test]
    fn configured_text_is_escaped() {
        let mut config = WidgetConfig::new("/chat");
        config.launcher_label = Some("<b>Ask & learn".into());
        config.launcher_aria_label = r#"say "hi""#.into();
        let html = render_widget(&config);

        assert!(html.contains("<span>&lt;b&gt;Ask &amp; learn</span>"));
        assert!(html.contains(r#"aria-label="say &quot;hi&quot;""#));
    }

    #[test]
    fn theme_is_absent_without_colors() {
        assert_eq!(render_theme(&LauncherTheme::default()), None);
    }

    #[test]
    fn theme_renders_only_configured_rules() {
        let theme = LauncherTheme {
            bg_color: Some("#0a0a0a".into()),
            text_color_hover: Some("white".into()),
            ..LauncherTheme::default()
        };

        assert_eq!(
            render_theme(&theme).as_deref(),
            Some(concat!(
                r#"<style id="knowbot-theme">"#,
                "#knowbot-button{background-color:#0a0a0a;}",
                "#knowbot-button:hover,#knowbot-button:focus{color:white;}",
                "</style>",
            ))
        );
    }

    #[test]
    fn theme_values_cannot_break_out_of_the_style_block() {
        let theme = LauncherTheme {
            text_color: Some("red;}</style><script>".into()),
            ..LauncherTheme::default()
        };
        let css = render_theme(&theme).unwrap();

        assert!(css.contains("color:red/stylescript;"));
        assert_eq!(css.matches("</style>").count(), 1);
    }
}
