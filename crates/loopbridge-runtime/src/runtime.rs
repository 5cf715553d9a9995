//! Tokio runtime ownership

use crate::scheduler::LoopScheduler;
use crate::shutdown::{ShutdownHandle, ShutdownSignal};
use loopbridge_core::{BridgeError, BridgeResult};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// Configuration for the event loop
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of worker threads (None = number of CPU cores)
    pub worker_threads: Option<usize>,
    /// Name prefix for worker threads
    pub thread_name: String,
    /// Enable I/O driver
    pub enable_io: bool,
    /// Enable time driver
    pub enable_time: bool,
    /// Maximum blocking threads
    pub max_blocking_threads: usize,
    /// Maximum concurrently registered deployments (None = unbounded)
    pub max_deployments: Option<usize>,
    /// How long release waits for runtime threads to stop
    pub release_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: Some(1),
            thread_name: "loopbridge-loop".to_string(),
            enable_io: true,
            enable_time: true,
            max_blocking_threads: 512,
            max_deployments: None,
            release_timeout: Duration::from_secs(5),
        }
    }
}

impl RuntimeConfig {
    /// Create a new runtime configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Set the thread name prefix
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Cap the number of concurrently registered deployments
    pub fn with_max_deployments(mut self, max: usize) -> Self {
        self.max_deployments = Some(max);
        self
    }

    /// Set how long release waits for runtime threads to stop
    pub fn with_release_timeout(mut self, timeout: Duration) -> Self {
        self.release_timeout = timeout;
        self
    }
}

/// Summary of a completed release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseReport {
    /// Deployments still registered at release time, now undeployed
    pub undeployed: usize,
}

/// Owns the Tokio runtime that acts as the event loop
///
/// The loop is created once and released once; [`EventLoop::release`]
/// consumes it.
pub struct EventLoop {
    runtime: Option<Runtime>,
    handle: tokio::runtime::Handle,
    scheduler: LoopScheduler,
    shutdown_handle: ShutdownHandle,
    config: RuntimeConfig,
}

impl EventLoop {
    /// Create a new event loop with the given configuration
    pub fn new(config: RuntimeConfig) -> BridgeResult<Self> {
        let mut builder = Builder::new_multi_thread();

        if let Some(threads) = config.worker_threads {
            builder.worker_threads(threads);
        }

        builder
            .thread_name(&config.thread_name)
            .max_blocking_threads(config.max_blocking_threads);

        if config.enable_io {
            builder.enable_io();
        }

        if config.enable_time {
            builder.enable_time();
        }

        let runtime = builder
            .build()
            .map_err(|e| BridgeError::Runtime(format!("Failed to create runtime: {}", e)))?;

        let handle = runtime.handle().clone();
        let shutdown_handle = ShutdownHandle::new();
        let scheduler = LoopScheduler::new(
            handle.clone(),
            shutdown_handle.signal(),
            config.max_deployments,
        );

        Ok(Self {
            runtime: Some(runtime),
            handle,
            scheduler,
            shutdown_handle,
            config,
        })
    }

    /// Create an event loop with default configuration
    pub fn with_defaults() -> BridgeResult<Self> {
        Self::new(RuntimeConfig::default())
    }

    /// Get the loop configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Get a handle to the underlying Tokio runtime
    pub fn handle(&self) -> tokio::runtime::Handle {
        self.handle.clone()
    }

    /// Get the scheduler that deploys units onto this loop
    pub fn scheduler(&self) -> LoopScheduler {
        self.scheduler.clone()
    }

    /// Get a signal that fires when the loop is being released
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown_handle.signal()
    }

    /// Check if release has started
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_handle.is_triggered()
    }

    /// Block on a future from a thread outside the loop
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: std::future::Future,
    {
        self.handle.block_on(future)
    }

    /// Spawn a task on the loop
    pub fn spawn<F>(&self, future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Release the loop
    ///
    /// Undeploys every remaining deployment, signals shutdown to tasks, then
    /// stops the runtime and waits up to the configured release timeout for
    /// its threads. Must be called from outside the loop.
    pub fn release(mut self) -> BridgeResult<ReleaseReport> {
        let runtime = self
            .runtime
            .take()
            .ok_or_else(|| BridgeError::Runtime("event loop already released".to_string()))?;

        tracing::debug!("Releasing event loop");
        self.shutdown_handle.trigger();

        let scheduler = self.scheduler.clone();
        let undeployed = runtime.block_on(async move { scheduler.undeploy_all().await });

        runtime.shutdown_timeout(self.config.release_timeout);
        tracing::debug!(undeployed, "Event loop released");

        Ok(ReleaseReport { undeployed })
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.shutdown_handle.trigger();
        if let Some(runtime) = self.runtime.take() {
            // Dropping a runtime from inside async context panics
            runtime.shutdown_background();
        }
    }
}
