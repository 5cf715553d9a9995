//! Destinations for log records

use loopbridge_core::LogLevel;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;

/// A single log record emitted by a [`Logger`](crate::Logger)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity of the record
    pub level: LogLevel,
    /// Name of the logger that emitted the record
    pub logger: String,
    /// Rendered message
    pub message: String,
    /// Rendered cause chain, for records that report a failure
    pub cause: Option<String>,
}

/// Receiver for log records that passed the logger's visible level
pub trait LogSink: Send + Sync {
    /// Write a record
    fn record(&self, record: &LogRecord);
}

/// Global tracing sink
static TRACING_SINK: OnceCell<Arc<TracingSink>> = OnceCell::new();

/// Sink that forwards records as `tracing` events
#[derive(Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Get the shared tracing sink
    pub fn shared() -> Arc<TracingSink> {
        TRACING_SINK.get_or_init(|| Arc::new(TracingSink)).clone()
    }
}

impl LogSink for TracingSink {
    fn record(&self, record: &LogRecord) {
        let logger = record.logger.as_str();
        let cause = record.cause.as_deref();
        match record.level {
            LogLevel::Trace => tracing::trace!(logger, cause, "{}", record.message),
            LogLevel::Debug => tracing::debug!(logger, cause, "{}", record.message),
            LogLevel::Info => tracing::info!(logger, cause, "{}", record.message),
            LogLevel::Warn => tracing::warn!(logger, cause, "{}", record.message),
            LogLevel::Error => tracing::error!(logger, cause, "{}", record.message),
            LogLevel::Fatal => {
                tracing::error!(logger, cause, fatal = true, "{}", record.message)
            }
            LogLevel::Off => {}
        }
    }
}

/// Sink that keeps records in memory
///
/// Used by tests to assert on what a bootstrap reported.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    /// Create an empty memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured records
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Number of captured records at the given level
    pub fn count(&self, level: LogLevel) -> usize {
        self.records.lock().iter().filter(|r| r.level == level).count()
    }

    /// Captured records at the given level whose message contains `needle`
    pub fn matching(&self, level: LogLevel, needle: &str) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level && r.message.contains(needle))
            .cloned()
            .collect()
    }

    /// Drop all captured records
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn record(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }
}
