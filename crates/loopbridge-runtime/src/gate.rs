//! One-shot gate between a blocked thread and the event loop
//!
//! The waiting side parks on a condition variable; the signaling side may be
//! any thread or task. The first signal wins, later signals are ignored, and a
//! signal recorded before [`CompletionGate::wait`] is entered is observed
//! immediately.

use loopbridge_core::{BridgeError, Completion};
use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

#[derive(Default)]
struct Shared {
    outcome: Mutex<Option<Completion>>,
    ready: Condvar,
}

impl Shared {
    fn complete(&self, completion: Completion) -> bool {
        let mut outcome = self.outcome.lock();
        if outcome.is_some() {
            return false;
        }
        *outcome = Some(completion);
        self.ready.notify_all();
        true
    }

    fn is_signaled(&self) -> bool {
        self.outcome.lock().is_some()
    }
}

/// Blocks one thread until a lifecycle run reports its outcome
pub struct CompletionGate {
    shared: Arc<Shared>,
}

impl CompletionGate {
    /// Create an unsignaled gate
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
        }
    }

    /// Create a gate that `token` can interrupt
    pub fn with_interrupt(token: &InterruptToken) -> Self {
        let gate = Self::new();
        token.attach(&gate.shared);
        gate
    }

    /// Handle for signaling this gate from another thread or task
    pub fn signaler(&self) -> GateSignal {
        GateSignal {
            shared: self.shared.clone(),
        }
    }

    /// Record success; `false` if an outcome was already recorded
    pub fn signal_success(&self) -> bool {
        self.shared.complete(Completion::Succeeded)
    }

    /// Record a failure; `false` if an outcome was already recorded
    pub fn signal_failure(&self, cause: BridgeError) -> bool {
        self.shared.complete(Completion::failed(cause))
    }

    /// Record `completion` unless another outcome was recorded first
    pub fn complete(&self, completion: Completion) -> bool {
        self.shared.complete(completion)
    }

    /// Check if an outcome has been recorded
    pub fn is_signaled(&self) -> bool {
        self.shared.is_signaled()
    }

    /// Block until an outcome is recorded and return it
    pub fn wait(&self) -> Completion {
        let mut outcome = self.shared.outcome.lock();
        loop {
            if let Some(completion) = outcome.as_ref() {
                return completion.clone();
            }
            self.shared.ready.wait(&mut outcome);
        }
    }

    /// Block until an outcome is recorded or `timeout` elapses
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Completion> {
        let deadline = Instant::now() + timeout;
        let mut outcome = self.shared.outcome.lock();
        loop {
            if let Some(completion) = outcome.as_ref() {
                return Some(completion.clone());
            }
            if self.shared.ready.wait_until(&mut outcome, deadline).timed_out() {
                return outcome.clone();
            }
        }
    }
}

impl Default for CompletionGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable signaling side of a [`CompletionGate`]
#[derive(Clone)]
pub struct GateSignal {
    shared: Arc<Shared>,
}

impl GateSignal {
    /// Record success; `false` if an outcome was already recorded
    pub fn signal_success(&self) -> bool {
        self.shared.complete(Completion::Succeeded)
    }

    /// Record a failure; `false` if an outcome was already recorded
    pub fn signal_failure(&self, cause: BridgeError) -> bool {
        self.shared.complete(Completion::failed(cause))
    }

    /// Record `completion` unless another outcome was recorded first
    pub fn complete(&self, completion: Completion) -> bool {
        self.shared.complete(completion)
    }

    /// Check if the gate holds an outcome
    pub fn is_signaled(&self) -> bool {
        self.shared.is_signaled()
    }
}

#[derive(Default)]
struct TokenState {
    interrupted: bool,
    gates: Vec<Weak<Shared>>,
}

/// Interrupts the thread blocked on one or more gates
///
/// Interrupting completes every attached gate with
/// [`Completion::Interrupted`] unless it already holds an outcome. Gates
/// attached after the interrupt are interrupted on attach.
#[derive(Clone, Default)]
pub struct InterruptToken {
    state: Arc<Mutex<TokenState>>,
}

impl InterruptToken {
    /// A token with no gates attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupt all attached gates
    pub fn interrupt(&self) {
        let gates = {
            let mut state = self.state.lock();
            if state.interrupted {
                return;
            }
            state.interrupted = true;
            std::mem::take(&mut state.gates)
        };
        for gate in gates.iter().filter_map(Weak::upgrade) {
            gate.complete(Completion::Interrupted);
        }
    }

    /// Check if [`InterruptToken::interrupt`] has been called
    pub fn is_interrupted(&self) -> bool {
        self.state.lock().interrupted
    }

    fn attach(&self, gate: &Arc<Shared>) {
        let mut state = self.state.lock();
        if state.interrupted {
            drop(state);
            gate.complete(Completion::Interrupted);
            return;
        }
        state.gates.retain(|g| g.strong_count() > 0);
        state.gates.push(Arc::downgrade(gate));
    }
}

#[cfg(test)]
#[path = "gate/gate_tests.rs"]
mod gate_tests;
