//! The one-shot outcome of a lifecycle run

use crate::{BridgeError, PhaseResult};
use std::sync::Arc;

/// Process exit status for a successful run
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit status for a failed or interrupted run
pub const EXIT_FAILURE: i32 = 1;

/// Terminal outcome of a lifecycle run
///
/// A completion is produced at most once per run and never changes after
/// it has been recorded.
#[derive(Debug, Clone)]
pub enum Completion {
    /// Every phase succeeded
    Succeeded,
    /// A phase (or registration) failed with the given cause
    Failed(Arc<BridgeError>),
    /// The waiting thread was interrupted before any signal arrived
    Interrupted,
}

impl Completion {
    /// Create a failed completion
    pub fn failed(cause: BridgeError) -> Self {
        Completion::Failed(Arc::new(cause))
    }

    /// Combine the execute and finalize results into the run outcome
    ///
    /// Execute's cause wins when both fail; finalize's cause is only
    /// reported when execute succeeded.
    pub fn from_phases(execute: PhaseResult, finalize: PhaseResult) -> Self {
        match (execute, finalize) {
            (Err(cause), _) => Completion::failed(BridgeError::Execute(cause)),
            (Ok(()), Err(cause)) => Completion::failed(BridgeError::Finalize(cause)),
            (Ok(()), Ok(())) => Completion::Succeeded,
        }
    }

    /// Check if the run succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Completion::Succeeded)
    }

    /// The failure cause, if the run failed
    pub fn cause(&self) -> Option<&BridgeError> {
        match self {
            Completion::Failed(cause) => Some(cause),
            _ => None,
        }
    }

    /// Exit status derived from this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Completion::Succeeded => EXIT_SUCCESS,
            Completion::Failed(_) | Completion::Interrupted => EXIT_FAILURE,
        }
    }
}

impl std::fmt::Display for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Completion::Succeeded => write!(f, "succeeded"),
            Completion::Failed(cause) => write!(f, "failed: {}", cause),
            Completion::Interrupted => write!(f, "interrupted"),
        }
    }
}
