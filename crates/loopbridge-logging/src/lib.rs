//! loopbridge-logging - Logger handles backed by `tracing`
//!
//! This crate provides:
//! - [`Logger`] named handle with a settable visible level
//! - [`LoggerFactory`] with tracing-backed and in-memory implementations
//! - [`init_logging`] to install a subscriber with a reloadable level

mod factory;
mod logger;
mod reload;
mod sink;

pub use factory::{LoggerFactory, MemoryLoggerFactory, TracingLoggerFactory};
pub use logger::Logger;
pub use loopbridge_core::LogLevel;
pub use reload::{ReloadHandle, init_logging};
pub use sink::{LogRecord, LogSink, MemorySink, TracingSink};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{LogLevel, Logger, LoggerFactory, TracingLoggerFactory, init_logging};
}
