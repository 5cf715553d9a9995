//! Shared event loop for asynchronous tests
//!
//! A test module creates one [`FixtureScope`] for all of its tests and hands
//! it to each [`TestFixture`] by reference. Closing the scope with
//! [`FixtureScope::close`] is the end-of-scope step that stops the loop:
//!
//! ```ignore
//! let scope = FixtureScope::with_defaults()?;
//! TestFixture::new(&scope)?.run_test(Duration::from_secs(1), |ctx| async move {
//!     ctx.complete_now();
//! })?;
//! scope.close()?;
//! ```
//!
//! libtest has no hook that runs after the last test of a binary, so a scope
//! shared through a `static` cannot be closed. Its loop is reclaimed when the
//! test process exits:
//!
//! ```ignore
//! use loopbridge::prelude::*;
//! use once_cell::sync::Lazy;
//!
//! static SCOPE: Lazy<FixtureScope> = Lazy::new(|| FixtureScope::with_defaults().unwrap());
//!
//! #[test]
//! fn timer_fires() {
//!     let fixture = TestFixture::new(&SCOPE).unwrap();
//!     fixture
//!         .run_test(Duration::from_secs(1), |ctx| async move {
//!             let done = ctx.checkpoint();
//!             tokio::time::sleep(Duration::from_millis(10)).await;
//!             done.flag();
//!         })
//!         .unwrap();
//! }
//! ```

use crate::testkit::TestContext;
use loopbridge_core::{BridgeResult, ConfigTree, DEFAULT_PROPERTIES_FILE, LogLevel};
use loopbridge_logging::{Logger, LoggerFactory, TracingLoggerFactory};
use loopbridge_runtime::{EventLoop, ReleaseReport, RuntimeConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Owns the event loop shared by the tests of one scope
///
/// Call [`FixtureScope::close`] once the last fixture is done with the scope.
/// Dropping an unclosed scope still shuts the loop down, but without waiting
/// for outstanding deployments. A scope held in a `static` is never dropped,
/// so its loop lives until the test process exits.
pub struct FixtureScope {
    event_loop: EventLoop,
}

impl FixtureScope {
    /// Start the shared loop with `config`
    pub fn new(config: RuntimeConfig) -> BridgeResult<Self> {
        let event_loop = EventLoop::new(config)?;
        tracing::debug!("Fixture scope started");
        Ok(Self { event_loop })
    }

    /// Start the shared loop with [`RuntimeConfig::default`]
    pub fn with_defaults() -> BridgeResult<Self> {
        Self::new(RuntimeConfig::default())
    }

    /// The loop shared by every fixture of this scope
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// Release the shared event loop
    ///
    /// Undeploys whatever is still deployed, then shuts the loop down. No
    /// [`TestFixture`] can outlive this call.
    pub fn close(self) -> BridgeResult<ReleaseReport> {
        self.event_loop.release()
    }
}

/// Customization points for [`TestFixture`]
pub trait FixtureHooks {
    /// Fill the fixture's configuration, from `config.properties` by default
    fn load_local_config(&self, config: &mut ConfigTree) -> BridgeResult<()> {
        config.load_properties_file(DEFAULT_PROPERTIES_FILE)
    }

    /// Factory for the fixture's logger
    fn logger_factory(&self) -> Arc<dyn LoggerFactory> {
        TracingLoggerFactory::shared()
    }

    /// Name of the fixture's logger
    fn logger_name(&self) -> String {
        "test-fixture".to_string()
    }

    /// Lowest level the fixture's logger emits
    fn visible_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

/// Hooks that load `config.properties` and log through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl FixtureHooks for DefaultHooks {}

/// Per-test view of a [`FixtureScope`]
pub struct TestFixture<'s> {
    scope: &'s FixtureScope,
    config: ConfigTree,
    logger: Logger,
}

impl<'s> TestFixture<'s> {
    /// Build a fixture with [`DefaultHooks`]
    pub fn new(scope: &'s FixtureScope) -> BridgeResult<Self> {
        Self::with_hooks(scope, &DefaultHooks)
    }

    /// Build a fixture, loading configuration and the logger through `hooks`
    pub fn with_hooks(scope: &'s FixtureScope, hooks: &dyn FixtureHooks) -> BridgeResult<Self> {
        let mut config = ConfigTree::new();
        hooks.load_local_config(&mut config)?;

        let logger = hooks.logger_factory().create_logger(&hooks.logger_name());
        logger.set_visible_level(hooks.visible_level());

        Ok(Self {
            scope,
            config,
            logger,
        })
    }

    /// The scope's shared loop
    pub fn event_loop(&self) -> &EventLoop {
        self.scope.event_loop()
    }

    /// Logger built by the hooks
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Configuration loaded by the hooks
    pub fn config(&self) -> &ConfigTree {
        &self.config
    }

    /// Run `body` on the shared loop and block until its context finishes
    ///
    /// The body gets a fresh [`TestContext`]. Returns `Ok` once the context
    /// completes, the failure if the body fails it or panics, and
    /// [`BridgeError::Timeout`](loopbridge_core::BridgeError::Timeout) if
    /// nothing happens within `timeout`. The body task is aborted afterwards.
    pub fn run_test<F, Fut>(&self, timeout: Duration, body: F) -> BridgeResult<()>
    where
        F: FnOnce(TestContext) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ctx = TestContext::new();
        let event_loop = self.event_loop();

        let task = event_loop.spawn(body(ctx.clone()));
        let abort = task.abort_handle();

        let watcher = ctx.clone();
        event_loop.spawn(async move {
            if let Err(e) = task.await
                && e.is_panic()
            {
                let payload = e.into_panic();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                watcher.fail_now(format!("test body panicked: {}", message));
            }
        });

        let result = ctx.await_completion(timeout);
        abort.abort();

        if let Err(e) = &result {
            self.logger.error(format!("Test failed: {}", e));
        }
        result
    }
}
