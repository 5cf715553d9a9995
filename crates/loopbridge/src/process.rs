//! Hosting one unit per process from a blocking `main`

use crate::resolver::UnitResolver;
use crate::unit::{InstantUnit, UnitContext, UnitPhases};
use loopbridge_core::{BridgeResult, Completion, ConfigTree};
use loopbridge_logging::Logger;
use loopbridge_runtime::{
    CompletionGate, EventLoop, InterruptToken, LifecycleRunner, ReleaseReport,
};
use std::future::Future;
use std::sync::Arc;

/// Outcome of [`ProcessBootstrap::launch`]
#[derive(Debug, Clone)]
pub struct LaunchReport {
    /// What the run reported, or the startup failure that prevented it
    pub completion: Completion,
    /// Process exit status derived from `completion`
    pub exit_code: i32,
    /// Present when an event loop was created and released
    pub release: Option<ReleaseReport>,
}

impl LaunchReport {
    fn new(completion: Completion, release: Option<ReleaseReport>) -> Self {
        Self {
            exit_code: completion.exit_code(),
            completion,
            release,
        }
    }
}

/// Runs a unit on a fresh event loop and blocks until it finishes
///
/// The calling thread loads configuration, starts the loop, deploys the unit
/// and then parks until the unit reports back or the bootstrap's
/// [`InterruptToken`] fires. The loop is released on every path that created
/// it.
///
/// Ctrl-C is turned into an interrupt by [`ProcessBootstrap::exit`] unless
/// disabled. [`ProcessBootstrap::launch`] leaves SIGINT alone unless enabled
/// with [`ProcessBootstrap::handle_ctrl_c`], because the OS-level handler
/// stays installed for the rest of the process.
pub struct ProcessBootstrap {
    unit: Arc<dyn InstantUnit>,
    interrupt: InterruptToken,
    handle_ctrl_c: Option<bool>,
}

impl ProcessBootstrap {
    /// Bootstrap a unit owned by the bootstrap
    pub fn new(unit: impl InstantUnit) -> Self {
        Self::from_shared(Arc::new(unit))
    }

    /// Bootstrap a unit produced by a [`UnitResolver`]
    pub fn from_boxed(unit: Box<dyn InstantUnit>) -> Self {
        Self::from_shared(Arc::from(unit))
    }

    /// Bootstrap a unit the caller keeps a handle on
    pub fn from_shared(unit: Arc<dyn InstantUnit>) -> Self {
        Self {
            unit,
            interrupt: InterruptToken::new(),
            handle_ctrl_c: None,
        }
    }

    /// Use `token` to interrupt the blocked wait
    pub fn with_interrupt_token(mut self, token: InterruptToken) -> Self {
        self.interrupt = token;
        self
    }

    /// Whether Ctrl-C interrupts the blocked wait
    ///
    /// Defaults to off for [`ProcessBootstrap::launch`] and on for
    /// [`ProcessBootstrap::exit`]. Once enabled, SIGINT no longer terminates
    /// the process by default, even after the launch has returned.
    pub fn handle_ctrl_c(mut self, enabled: bool) -> Self {
        self.handle_ctrl_c = Some(enabled);
        self
    }

    /// Token that interrupts this bootstrap's wait
    pub fn interrupt_token(&self) -> InterruptToken {
        self.interrupt.clone()
    }

    /// Run the unit to completion and report the outcome
    ///
    /// Blocks the calling thread. Must not be called from inside a Tokio
    /// runtime.
    pub fn launch(&self, args: &[String]) -> LaunchReport {
        self.run(args, self.handle_ctrl_c.unwrap_or(false))
    }

    /// Run the unit and exit the process with the derived status
    pub fn exit(&self, args: &[String]) -> ! {
        let report = self.run(args, self.handle_ctrl_c.unwrap_or(true));
        std::process::exit(report.exit_code)
    }

    fn run(&self, args: &[String], handle_ctrl_c: bool) -> LaunchReport {
        let unit_name = self.unit.name().to_string();

        let mut config = ConfigTree::new();
        if let Err(e) = self.unit.load_local_configuration(&mut config) {
            tracing::error!(unit = %unit_name, fatal = true, "Failed to load local configuration: {}", e);
            return LaunchReport::new(Completion::failed(e), None);
        }

        let event_loop = match EventLoop::new(self.unit.runtime_config()) {
            Ok(event_loop) => event_loop,
            Err(e) => {
                tracing::error!(unit = %unit_name, fatal = true, "Failed to start event loop: {}", e);
                return LaunchReport::new(Completion::failed(e), None);
            }
        };

        let logger = self.unit.logger_factory().create_logger(&unit_name);
        logger.set_visible_level(self.unit.visible_level());

        let gate = CompletionGate::with_interrupt(&self.interrupt);
        if handle_ctrl_c {
            self.watch_ctrl_c(&event_loop, &logger);
        }

        let ctx = UnitContext::new(
            Arc::new(config),
            logger.clone(),
            event_loop.handle(),
            event_loop.shutdown_signal(),
            args,
        );
        let phases = Arc::new(UnitPhases::new(self.unit.clone(), ctx));
        let runner = LifecycleRunner::new(phases, gate.signaler(), logger.clone())
            .with_options(self.unit.deployment_options());

        // A registration failure has already been signaled to the gate
        let _ = runner.start(Arc::new(event_loop.scheduler()));

        let completion = gate.wait();
        if matches!(completion, Completion::Interrupted) {
            logger.fatal("Interrupted while waiting for the run to complete");
        }

        let release = match event_loop.release() {
            Ok(report) => Some(report),
            Err(e) => {
                logger.error(format!("Failed to release event loop: {}", e));
                None
            }
        };

        LaunchReport::new(completion, release)
    }

    /// Install the Ctrl-C listener before anything is deployed
    fn watch_ctrl_c(&self, event_loop: &EventLoop, logger: &Logger) {
        let handle = event_loop.handle();
        let listener = {
            let _entered = handle.enter();
            listen_for_interrupt()
        };
        let interrupted = match listener {
            Ok(interrupted) => interrupted,
            Err(e) => {
                logger.warn(format!("Unable to listen for Ctrl-C: {}", e));
                return;
            }
        };

        let token = self.interrupt.clone();
        let logger = logger.clone();
        let mut shutdown = event_loop.shutdown_signal();

        event_loop.spawn(async move {
            tokio::select! {
                _ = interrupted => {
                    logger.warn("Ctrl-C received, interrupting");
                    token.interrupt();
                }
                _ = shutdown.wait() => {}
            }
        });
    }
}

// The OS handler is registered when these are called, not when the returned
// future is first polled, so a Ctrl-C arriving in between is not lost.

#[cfg(unix)]
fn listen_for_interrupt() -> std::io::Result<impl Future<Output = ()> + Send + 'static> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut stream = signal(SignalKind::interrupt())?;
    Ok(async move {
        if stream.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    })
}

#[cfg(windows)]
fn listen_for_interrupt() -> std::io::Result<impl Future<Output = ()> + Send + 'static> {
    let mut stream = tokio::signal::windows::ctrl_c()?;
    Ok(async move {
        if stream.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    })
}

#[cfg(not(any(unix, windows)))]
fn listen_for_interrupt() -> std::io::Result<impl Future<Output = ()> + Send + 'static> {
    Ok(async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
}

/// Resolve the unit named by the process arguments, run it and exit
///
/// Only a resolution failure returns; every other outcome ends the process.
///
/// ```ignore
/// fn main() -> loopbridge::BridgeResult<()> {
///     let registry = UnitRegistry::new()
///         .register_default::<NightlyReport>("nightly-report")
///         .register_default::<Cleanup>("cleanup");
///     loopbridge::run_main(&registry)
/// }
/// ```
pub fn run_main(resolver: &dyn UnitResolver) -> BridgeResult<()> {
    let full: Vec<String> = std::env::args().collect();
    let tail: Vec<String> = full.iter().skip(1).cloned().collect();

    let unit = resolver.resolve(&full, &tail)?;
    ProcessBootstrap::from_boxed(unit).exit(&tail)
}
