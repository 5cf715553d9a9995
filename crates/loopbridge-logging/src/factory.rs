//! Logger factories

use crate::logger::Logger;
use crate::sink::{LogSink, MemorySink, TracingSink};
use std::sync::Arc;

/// Creates named loggers
pub trait LoggerFactory: Send + Sync {
    /// Create a logger with the given name
    fn create_logger(&self, name: &str) -> Logger;
}

/// Factory for loggers that forward to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLoggerFactory;

impl TracingLoggerFactory {
    /// The factory as a shareable trait object
    pub fn shared() -> Arc<dyn LoggerFactory> {
        Arc::new(TracingLoggerFactory)
    }
}

impl LoggerFactory for TracingLoggerFactory {
    fn create_logger(&self, name: &str) -> Logger {
        Logger::new(name, TracingSink::shared())
    }
}

/// Factory for loggers that capture records in one shared [`MemorySink`]
#[derive(Debug, Default, Clone)]
pub struct MemoryLoggerFactory {
    sink: Arc<MemorySink>,
}

impl MemoryLoggerFactory {
    /// Create a factory with a fresh sink
    pub fn new() -> Self {
        Self::default()
    }

    /// The sink every logger from this factory writes to
    pub fn sink(&self) -> Arc<MemorySink> {
        self.sink.clone()
    }
}

impl LoggerFactory for MemoryLoggerFactory {
    fn create_logger(&self, name: &str) -> Logger {
        let sink: Arc<dyn LogSink> = self.sink.clone();
        Logger::new(name, sink)
    }
}
