//! Named logger handles with a settable visible level

use crate::sink::{LogRecord, LogSink};
use loopbridge_core::LogLevel;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Named logger handle
///
/// Clones share the same visible level and sink.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    name: String,
    level: AtomicU8,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    /// Create a logger writing to `sink`, visible from `Info` upwards
    pub fn new(name: impl Into<String>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                name: name.into(),
                level: AtomicU8::new(LogLevel::Info as u8),
                sink,
            }),
        }
    }

    /// Logger name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Minimum level that reaches the sink
    pub fn visible_level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.level.load(Ordering::SeqCst))
    }

    /// Set the minimum level that reaches the sink
    pub fn set_visible_level(&self, level: LogLevel) {
        self.inner.level.store(level as u8, Ordering::SeqCst);
    }

    /// Check if a level is visible
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.visible_level()
    }

    /// Emit a message at the given level
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(level, message.into(), None);
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Emit a fatal message carrying the full cause chain of `cause`
    pub fn fatal_with(
        &self,
        message: impl Into<String>,
        cause: &(dyn std::error::Error + 'static),
    ) {
        if !self.is_enabled(LogLevel::Fatal) {
            return;
        }
        self.emit(LogLevel::Fatal, message.into(), Some(render_chain(cause)));
    }

    fn emit(&self, level: LogLevel, message: String, cause: Option<String>) {
        if !self.is_enabled(level) {
            return;
        }
        self.inner.sink.record(&LogRecord {
            level,
            logger: self.inner.name.clone(),
            message,
            cause,
        });
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.inner.name)
            .field("visible_level", &self.visible_level())
            .finish()
    }
}

/// Render an error and its sources as `outer: inner: root`
fn render_chain(cause: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = cause.to_string();
    let mut source = cause.source();
    while let Some(err) = source {
        let text = err.to_string();
        // anyhow-backed variants already print their chain in Display
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = err.source();
    }
    rendered
}
