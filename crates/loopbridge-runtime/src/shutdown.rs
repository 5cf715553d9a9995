//! Release notification for tasks running on the event loop

use tokio::sync::watch;

/// Handle for announcing that the event loop is being released
#[derive(Clone)]
pub struct ShutdownHandle {
    sender: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Create a new, untriggered shutdown handle
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Trigger shutdown; later calls are no-ops
    pub fn trigger(&self) {
        self.sender.send_if_modified(|triggered| !std::mem::replace(triggered, true));
    }

    /// Check if shutdown has been triggered
    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Get a signal that tasks can await
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Signal for detecting shutdown (cloneable, can be moved into tasks)
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Check if shutdown has been triggered (non-blocking)
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait for shutdown to be triggered
    ///
    /// Returns immediately if already triggered, and also when the handle
    /// has been dropped.
    pub async fn wait(&mut self) {
        let _ = self.receiver.wait_for(|triggered| *triggered).await;
    }
}
