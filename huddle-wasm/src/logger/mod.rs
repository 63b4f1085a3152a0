use std::fmt::{self, Write};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use wasm_bindgen::JsValue;
use web_sys::console;

pub struct Logger;

impl Logger {
    pub fn info(msg: &str) {
        console::log_1(&format!("[huddle] {}", msg).into());
    }

    pub fn warn(msg: &str) {
        console::warn_1(&format!("[huddle] {}", msg).into());
    }

    pub fn error(msg: &str, err: &JsValue) {
        console::error_2(&format!("[huddle] {}", msg).into(), err);
    }

    pub fn debug(msg: &str) {
        console::debug_1(&format!("[huddle] {}", msg).into());
    }

    /// Routes `tracing` events from the call logic to the console. Only the
    /// first call installs anything.
    pub fn install() {
        let subscriber = tracing_subscriber::registry()
            .with(ConsoleLayer)
            .with(LevelFilter::INFO);
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            Logger::debug("tracing routed to console");
        }
    }
}

/// Forwards each event to the matching console method.
pub struct ConsoleLayer;

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let line = render(event);
        match *event.metadata().level() {
            Level::ERROR => console::error_1(&format!("[huddle] {}", line).into()),
            Level::WARN => Logger::warn(&line),
            Level::INFO => Logger::info(&line),
            _ => Logger::debug(&line),
        }
    }
}

/// `target: message key=value ...`
fn render(event: &Event<'_>) -> String {
    let mut text = EventText::default();
    event.record(&mut text);
    format!("{}: {}{}", event.metadata().target(), text.message, text.fields)
}

#[derive(Default)]
struct EventText {
    message: String,
    fields: String,
}

impl Visit for EventText {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}
