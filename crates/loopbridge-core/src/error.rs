//! Error types for the lifecycle bridge

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Result type returned by user-supplied lifecycle phases
pub type PhaseResult = anyhow::Result<()>;

/// Error type for bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Local configuration could not be loaded before the runtime was created
    #[error("failed to load configuration from {}: {source}", path.display())]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The unit could not be registered with the event loop scheduler
    #[error("registration failed: {0}")]
    Registration(String),

    /// The prepare phase failed
    #[error("prepare phase failed: {0:#}")]
    Prepare(#[source] anyhow::Error),

    /// The execute phase failed
    #[error("execute phase failed: {0:#}")]
    Execute(#[source] anyhow::Error),

    /// The finalize phase failed
    #[error("finalize phase failed: {0:#}")]
    Finalize(#[source] anyhow::Error),

    /// The blocked thread was interrupted before a signal arrived
    #[error("wait interrupted")]
    Interrupted,

    /// The unit to run could not be resolved from the invocation
    #[error("unit resolution failed: {0}")]
    Resolution(String),

    /// Event loop construction or release failed
    #[error("runtime error: {0}")]
    Runtime(String),

    /// No deployment is registered under the given id
    #[error("unknown deployment: {0}")]
    UnknownDeployment(String),

    /// A bounded wait elapsed
    #[error("timed out")]
    Timeout,

    /// An asynchronous test reported a failure
    #[error("test failed: {0}")]
    TestFailure(String),
}

impl BridgeError {
    /// Returns a stable numeric code for the error kind
    pub fn error_code(&self) -> u32 {
        match self {
            BridgeError::ConfigLoad { .. } => 1,
            BridgeError::Registration(_) => 2,
            BridgeError::Prepare(_) => 3,
            BridgeError::Execute(_) => 4,
            BridgeError::Finalize(_) => 5,
            BridgeError::Interrupted => 6,
            BridgeError::Resolution(_) => 7,
            BridgeError::Runtime(_) => 8,
            BridgeError::UnknownDeployment(_) => 9,
            BridgeError::Timeout => 10,
            BridgeError::TestFailure(_) => 11,
        }
    }

    /// Whether the error originated in one of the three lifecycle phases
    pub fn is_phase_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::Prepare(_) | BridgeError::Execute(_) | BridgeError::Finalize(_)
        )
    }

    /// The user-supplied cause behind a phase failure
    pub fn phase_cause(&self) -> Option<&anyhow::Error> {
        match self {
            BridgeError::Prepare(cause)
            | BridgeError::Execute(cause)
            | BridgeError::Finalize(cause) => Some(cause),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error/error_tests.rs"]
mod error_tests;
