//! Per-test completion tracking for asynchronous tests
//!
//! A [`TestContext`] completes once every [`Checkpoint`] it handed out has
//! been flagged, or when the test calls [`TestContext::complete_now`]. The
//! first failure wins and ends the test.

use loopbridge_core::{BridgeError, BridgeResult, Completion};
use loopbridge_runtime::CompletionGate;
use parking_lot::Mutex;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct ContextInner {
    gate: CompletionGate,
    // Checkpoints created but not yet fully flagged
    pending: Mutex<usize>,
}

/// Completion state of one asynchronous test
#[derive(Clone)]
pub struct TestContext {
    inner: Arc<ContextInner>,
}

impl TestContext {
    /// A context with no checkpoints
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                gate: CompletionGate::new(),
                pending: Mutex::new(0),
            }),
        }
    }

    /// A checkpoint that must be flagged once
    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint_n(1)
    }

    /// A checkpoint that must be flagged `required` times
    ///
    /// A checkpoint requiring zero flags is satisfied from the start and
    /// does not hold the test open.
    pub fn checkpoint_n(&self, required: usize) -> Checkpoint {
        if required > 0 {
            *self.inner.pending.lock() += 1;
        }
        Checkpoint {
            ctx: self.clone(),
            remaining: Arc::new(AtomicUsize::new(required)),
            required,
        }
    }

    /// Complete the test successfully now
    pub fn complete_now(&self) {
        self.inner.gate.signal_success();
    }

    /// Fail the test now
    pub fn fail_now(&self, cause: impl Display) {
        self.inner
            .gate
            .signal_failure(BridgeError::TestFailure(cause.to_string()));
    }

    /// Run an assertion block, failing the test if it returns an error
    pub fn verify<F>(&self, block: F)
    where
        F: FnOnce() -> anyhow::Result<()>,
    {
        if let Err(e) = block() {
            self.fail_now(format!("{:#}", e));
        }
    }

    /// Check if the test has succeeded
    pub fn completed(&self) -> bool {
        self.outcome().is_some_and(|c| c.is_success())
    }

    /// Check if the test has failed
    pub fn failed(&self) -> bool {
        self.outcome().is_some_and(|c| !c.is_success())
    }

    fn outcome(&self) -> Option<Completion> {
        self.inner.gate.wait_timeout(Duration::ZERO)
    }

    /// Block until the test completes, fails or `timeout` elapses
    pub fn await_completion(&self, timeout: Duration) -> BridgeResult<()> {
        match self.inner.gate.wait_timeout(timeout) {
            Some(Completion::Succeeded) => Ok(()),
            Some(Completion::Failed(cause)) => Err(match cause.as_ref() {
                BridgeError::TestFailure(message) => BridgeError::TestFailure(message.clone()),
                other => BridgeError::TestFailure(other.to_string()),
            }),
            Some(Completion::Interrupted) => Err(BridgeError::Interrupted),
            None => Err(BridgeError::Timeout),
        }
    }

    fn checkpoint_satisfied(&self) {
        let mut pending = self.inner.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.inner.gate.signal_success();
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts down towards the completion of a [`TestContext`]
///
/// Clones share the same count, so a checkpoint can be flagged from several
/// tasks.
#[derive(Clone)]
pub struct Checkpoint {
    ctx: TestContext,
    remaining: Arc<AtomicUsize>,
    required: usize,
}

impl Checkpoint {
    /// Record one pass
    ///
    /// Flagging a checkpoint more often than required fails the test.
    pub fn flag(&self) {
        let previous = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.ctx.checkpoint_satisfied(),
            Ok(_) => {}
            Err(_) => self.ctx.fail_now(format!(
                "checkpoint flagged more than the required {} time(s)",
                self.required
            )),
        }
    }

    /// Flags still needed
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }

    /// Check if every required flag has been recorded
    pub fn is_satisfied(&self) -> bool {
        self.remaining() == 0
    }
}
