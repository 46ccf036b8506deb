#![forbid(unsafe_code)]

//! `tracing` output for the browser console.
//!
//! [`ConsoleLayer`] formats each event as a single line
//! (`LEVEL target: message key=value ...`) and hands it to a sink. In the
//! browser the sink is `console.error` / `warn` / `info` / `debug` matching
//! the level; tests plug in a capturing closure.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::Context;

/// Level ceiling for the `debug` option.
#[must_use]
pub fn max_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.fields.push((field.name(), rendered));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.fields.push((field.name(), value.to_owned()));
        }
    }
}

fn format_event(event: &Event<'_>) -> String {
    let metadata = event.metadata();
    let mut visitor = EventVisitor::default();
    event.record(&mut visitor);

    let mut line = format!("{} {}:", metadata.level(), metadata.target());
    if let Some(message) = visitor.message {
        let _ = write!(line, " {message}");
    }
    for (name, value) in visitor.fields {
        let _ = write!(line, " {name}={value}");
    }
    line
}

/// Layer writing formatted events to a line sink.
pub struct ConsoleLayer<F> {
    sink: F,
}

impl<F> ConsoleLayer<F>
where
    F: Fn(Level, &str) + Send + Sync + 'static,
{
    pub fn new(sink: F) -> Self {
        Self { sink }
    }
}

impl<S, F> Layer<S> for ConsoleLayer<F>
where
    S: Subscriber,
    F: Fn(Level, &str) + Send + Sync + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        (self.sink)(*event.metadata().level(), &format_event(event));
    }
}

/// Route `tracing` to the browser console. Only the first call per page
/// takes effect.
#[cfg(target_arch = "wasm32")]
pub(crate) fn install(debug: bool) {
    use std::sync::Once;
    use tracing_subscriber::layer::SubscriberExt;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let layer = ConsoleLayer::new(write_console).with_filter(max_level(debug));
        let subscriber = tracing_subscriber::registry().with(layer);
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(target_arch = "wasm32")]
fn write_console(level: Level, line: &str) {
    let line = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::ERROR => web_sys::console::error_1(&line),
        Level::WARN => web_sys::console::warn_1(&line),
        Level::INFO => web_sys::console::info_1(&line),
        _ => web_sys::console::debug_1(&line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;
    use tracing_subscriber::layer::SubscriberExt;

    type Captured = Arc<Mutex<Vec<(Level, String)>>>;

    fn capture(debug: bool, emit: impl FnOnce()) -> Vec<(Level, String)> {
        let lines: Captured = Arc::default();
        let sink_lines = Arc::clone(&lines);
        let layer = ConsoleLayer::new(move |level: Level, line: &str| {
            sink_lines.lock().unwrap().push((level, line.to_owned()));
        });
        let subscriber = tracing_subscriber::registry().with(layer.with_filter(max_level(debug)));
        tracing::subscriber::with_default(subscriber, emit);

        let captured = lines.lock().unwrap().clone();
        captured
    }

    #[test]
    fn lines_carry_level_target_message_and_fields() {
        let lines = capture(false, || {
            tracing::warn!(target: "knowbot.config", key = "buton", "unknown option ignored");
        });

        assert_eq!(
            lines,
            vec![(
                Level::WARN,
                "WARN knowbot.config: unknown option ignored key=buton".to_owned()
            )]
        );
    }

    #[test]
    fn debug_flag_opens_the_debug_level() {
        let emit = || {
            tracing::debug!(target: "knowbot.session", is_active = true, "active state changed");
            tracing::trace!(target: "knowbot.session", "activity");
        };

        assert!(capture(false, emit).is_empty());
        assert_eq!(
            capture(true, emit),
            vec![(
                Level::DEBUG,
                "DEBUG knowbot.session: active state changed is_active=true".to_owned()
            )]
        );
    }
}
