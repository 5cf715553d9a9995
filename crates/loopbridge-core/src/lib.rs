//! loopbridge-core - Core types for the sync-to-async lifecycle bridge
//!
//! This crate provides the foundational types shared by the bootstraps:
//! - [`BridgeError`] for error handling
//! - [`Completion`] for the one-shot outcome of a run
//! - [`Phase`] and [`RunState`] for the lifecycle state machine
//! - [`ConfigTree`] for local configuration
//! - [`LogLevel`] for logger severity

mod completion;
mod config;
mod error;
mod lifecycle;

pub use completion::{Completion, EXIT_FAILURE, EXIT_SUCCESS};
pub use config::{ConfigTree, DEFAULT_PROPERTIES_FILE};
pub use error::{BridgeError, BridgeResult, PhaseResult};
pub use lifecycle::{Phase, RunState};

use serde::{Deserialize, Serialize};

/// Log severity levels
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
    Off = 6,
}

impl LogLevel {
    /// Level for a stored discriminant; unknown values map to `Off`
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            5 => LogLevel::Fatal,
            _ => LogLevel::Off,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Fatal => write!(f, "FATAL"),
            LogLevel::Off => write!(f, "OFF"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            "off" => Ok(LogLevel::Off),
            other => Err(BridgeError::Runtime(format!("unknown log level: {}", other))),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BridgeError, BridgeResult, Completion, ConfigTree, LogLevel, Phase, PhaseResult, RunState,
    };
}
