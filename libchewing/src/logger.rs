//! Log forwarding from `tracing` events to a session's log callback.
//!
//! Nothing is installed globally. Each boundary call on a session enters a
//! scoped dispatcher ([`LogSink::enter`]) whose only layer forwards events,
//! filtered by the session's [`LoggingConfig`], to the registered callback.

use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Process-wide trace switch, read once.
static DEBUG_SWITCH: Lazy<bool> = Lazy::new(|| {
    std::env::var("CHEWING_DEBUG").is_ok_and(|v| !v.is_empty() && v != "0")
});

pub fn verbose_enabled() -> bool {
    *DEBUG_SWITCH
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Verbose,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Verbose,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }

    /// Numeric level of the classic C logger.
    pub fn to_c(self) -> i32 {
        match self {
            LogLevel::Verbose => 1,
            LogLevel::Debug => 2,
            LogLevel::Info => 3,
            LogLevel::Warning => 4,
            LogLevel::Error => 5,
            LogLevel::Critical => 6,
        }
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warning,
            Level::INFO => LogLevel::Info,
            Level::DEBUG => LogLevel::Debug,
            Level::TRACE => LogLevel::Verbose,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which log events reach the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Levels admitted by the mask.
    pub levels: Vec<LogLevel>,
    /// Optional floor applied on top of the mask.
    pub min_level: Option<LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            levels: vec![
                LogLevel::Debug,
                LogLevel::Info,
                LogLevel::Warning,
                LogLevel::Error,
                LogLevel::Critical,
            ],
            min_level: None,
        }
    }
}

impl LoggingConfig {
    /// Verbose also needs the process-wide trace switch.
    pub fn admits(&self, level: LogLevel) -> bool {
        self.enabled
            && self.levels.contains(&level)
            && self.min_level.map_or(true, |min| level >= min)
            && (level != LogLevel::Verbose || verbose_enabled())
    }
}

pub type LogFn = Box<dyn FnMut(LogLevel, &str) + Send>;

/// Filter plus callback for one session.
#[derive(Default)]
pub struct LogSink {
    config: LoggingConfig,
    callback: Option<LogFn>,
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("config", &self.config)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

pub type SharedSink = Arc<Mutex<LogSink>>;

impl LogSink {
    pub fn shared(config: LoggingConfig, callback: Option<LogFn>) -> SharedSink {
        Arc::new(Mutex::new(LogSink { config, callback }))
    }

    pub fn set_callback(&mut self, callback: Option<LogFn>) {
        self.callback = callback;
    }

    pub fn set_config(&mut self, config: LoggingConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    pub fn emit(&mut self, level: LogLevel, message: &str) {
        if !self.config.admits(level) {
            return;
        }
        if let Some(cb) = self.callback.as_mut() {
            cb(level, message);
        }
    }

    /// Route `tracing` events on this thread to `sink` until the guard drops.
    pub fn enter(sink: &SharedSink) -> DefaultGuard {
        let subscriber = Registry::default().with(ForwardLayer {
            sink: Arc::clone(sink),
        });
        tracing::subscriber::set_default(subscriber)
    }
}

struct ForwardLayer {
    sink: SharedSink,
}

impl<S: Subscriber> Layer<S> for ForwardLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = LogLevel::from(*event.metadata().level());
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        // a callback that logs again must not deadlock
        if let Ok(mut sink) = self.sink.try_lock() {
            sink.emit(level, &visitor.finish());
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
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
