//! The unit of logic a [`ProcessBootstrap`](crate::ProcessBootstrap) hosts

use async_trait::async_trait;
use loopbridge_core::{BridgeResult, ConfigTree, DEFAULT_PROPERTIES_FILE, LogLevel, PhaseResult};
use loopbridge_logging::{Logger, LoggerFactory, TracingLoggerFactory};
use loopbridge_runtime::{DeploymentOptions, Phases, RuntimeConfig, ShutdownSignal};
use std::sync::Arc;

/// Logic run once per process on the event loop
///
/// Only [`InstantUnit::run`] is required. The other hooks customize how the
/// bootstrap configures itself before the loop exists (configuration,
/// runtime, logging) and what runs around `run` on the loop.
///
/// # Example
///
/// ```ignore
/// use loopbridge::prelude::*;
///
/// struct Report;
///
/// #[async_trait]
/// impl InstantUnit for Report {
///     async fn run(&self, ctx: &UnitContext) -> PhaseResult {
///         let target = ctx.config().get_or("report.target", "stdout");
///         ctx.logger().info(format!("Writing report to {}", target));
///         Ok(())
///     }
/// }
///
/// fn main() {
///     ProcessBootstrap::new(Report).exit(&std::env::args().skip(1).collect::<Vec<_>>())
/// }
/// ```
#[async_trait]
pub trait InstantUnit: Send + Sync + 'static {
    /// Name used for the logger and the deployment
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Load local configuration before the runtime is created
    ///
    /// A failure here is fatal: the process exits with status 1 and no
    /// runtime is ever started.
    fn load_local_configuration(&self, config: &mut ConfigTree) -> BridgeResult<()> {
        config.load_properties_file(DEFAULT_PROPERTIES_FILE)
    }

    /// Configuration for the event loop hosting this unit
    fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::default()
    }

    /// Factory for the unit's logger
    fn logger_factory(&self) -> Arc<dyn LoggerFactory> {
        TracingLoggerFactory::shared()
    }

    /// Minimum level the unit's logger lets through
    fn visible_level(&self) -> LogLevel {
        LogLevel::Debug
    }

    fn deployment_options(&self) -> DeploymentOptions {
        DeploymentOptions::new().with_name(self.name())
    }

    async fn before_run(&self, ctx: &UnitContext) -> PhaseResult {
        ctx.logger().debug("beforeRun...");
        Ok(())
    }

    /// The unit's main logic
    async fn run(&self, ctx: &UnitContext) -> PhaseResult;

    /// Runs once `run` settles, whether it succeeded or not
    async fn after_run(&self, ctx: &UnitContext) -> PhaseResult {
        ctx.logger().debug("afterRun...");
        Ok(())
    }
}

/// What a unit sees while it runs
#[derive(Clone)]
pub struct UnitContext {
    config: Arc<ConfigTree>,
    logger: Logger,
    handle: tokio::runtime::Handle,
    shutdown: ShutdownSignal,
    args: Arc<[String]>,
}

impl UnitContext {
    pub(crate) fn new(
        config: Arc<ConfigTree>,
        logger: Logger,
        handle: tokio::runtime::Handle,
        shutdown: ShutdownSignal,
        args: &[String],
    ) -> Self {
        Self {
            config,
            logger,
            handle,
            shutdown,
            args: args.into(),
        }
    }

    /// Configuration loaded before the runtime was created
    pub fn config(&self) -> &ConfigTree {
        &self.config
    }

    /// Logger named after the unit
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Handle to the event loop the unit runs on
    pub fn handle(&self) -> &tokio::runtime::Handle {
        &self.handle
    }

    /// Signal that fires once the event loop is being released
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Process arguments after the program name
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Adapts a unit's hooks to the runner's phases
pub(crate) struct UnitPhases {
    unit: Arc<dyn InstantUnit>,
    ctx: UnitContext,
}

impl UnitPhases {
    pub(crate) fn new(unit: Arc<dyn InstantUnit>, ctx: UnitContext) -> Self {
        Self { unit, ctx }
    }
}

#[async_trait]
impl Phases for UnitPhases {
    async fn prepare(&self) -> PhaseResult {
        self.unit.before_run(&self.ctx).await
    }

    async fn execute(&self) -> PhaseResult {
        self.unit.run(&self.ctx).await
    }

    async fn finalize(&self) -> PhaseResult {
        self.unit.after_run(&self.ctx).await
    }
}
