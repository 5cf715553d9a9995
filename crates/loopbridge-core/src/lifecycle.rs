//! Lifecycle phases and the run state machine

use serde::{Deserialize, Serialize};

/// One stage of a lifecycle run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Preparation before the main logic (optional, defaults to a no-op)
    Prepare,
    /// The main logic (required)
    Execute,
    /// Cleanup after the main logic, run whether or not it succeeded
    Finalize,
}

impl Phase {
    /// Phases in the order they run
    pub const ALL: [Phase; 3] = [Phase::Prepare, Phase::Execute, Phase::Finalize];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Prepare => write!(f, "prepare"),
            Phase::Execute => write!(f, "execute"),
            Phase::Finalize => write!(f, "finalize"),
        }
    }
}

/// State of a lifecycle run
///
/// State transitions:
/// ```text
/// Prepare → Execute → Finalize → Completed
///    │                    │
///    └──────→ Failed ←────┘
/// ```
///
/// A failed execute still moves on to `Finalize`; the run only reaches
/// `Failed` once finalize has settled, or directly when prepare fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Running the prepare phase
    #[default]
    Prepare,
    /// Running the execute phase
    Execute,
    /// Running the finalize phase
    Finalize,
    /// All phases succeeded
    Completed,
    /// A phase failed and the run is over
    Failed,
}

impl RunState {
    /// Check if this state can transition to the target state
    pub fn can_transition_to(&self, target: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, target),
            (Prepare, Execute)
                | (Prepare, Failed)
                | (Execute, Finalize)
                | (Finalize, Completed)
                | (Finalize, Failed)
        )
    }

    /// The phase running in this state, if any
    pub fn phase(&self) -> Option<Phase> {
        match self {
            RunState::Prepare => Some(Phase::Prepare),
            RunState::Execute => Some(Phase::Execute),
            RunState::Finalize => Some(Phase::Finalize),
            RunState::Completed | RunState::Failed => None,
        }
    }

    /// Check if the run is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Prepare => write!(f, "Prepare"),
            RunState::Execute => write!(f, "Execute"),
            RunState::Finalize => write!(f, "Finalize"),
            RunState::Completed => write!(f, "Completed"),
            RunState::Failed => write!(f, "Failed"),
        }
    }
}

#[cfg(test)]
#[path = "lifecycle/lifecycle_tests.rs"]
mod lifecycle_tests;
