//! Runs prepare, execute and finalize on the event loop

use crate::gate::GateSignal;
use crate::scheduler::{DeploymentId, DeploymentOptions, Scheduler, UnitFactory};
use async_trait::async_trait;
use loopbridge_core::{BridgeError, BridgeResult, Completion, Phase, PhaseResult, RunState};
use loopbridge_logging::Logger;
use std::sync::Arc;

/// The three lifecycle hooks driven by a [`LifecycleRunner`]
///
/// Hooks run on the event loop and must not block it; waiting is done by
/// awaiting, never by parking the thread.
#[async_trait]
pub trait Phases: Send + Sync + 'static {
    /// Preparation before the main logic
    async fn prepare(&self) -> PhaseResult {
        Ok(())
    }

    /// The main logic
    async fn execute(&self) -> PhaseResult;

    /// Cleanup, run once execute settles whether it succeeded or not
    async fn finalize(&self) -> PhaseResult {
        Ok(())
    }
}

/// Drives one lifecycle run and reports its outcome to a gate
///
/// The run is deployed as a single unit. Once it reaches a terminal state the
/// unit retires its own deployment and then emits exactly one signal.
pub struct LifecycleRunner {
    phases: Arc<dyn Phases>,
    signal: GateSignal,
    logger: Logger,
    options: DeploymentOptions,
}

impl LifecycleRunner {
    /// Runner reporting through `signal` and `logger`
    pub fn new(phases: Arc<dyn Phases>, signal: GateSignal, logger: Logger) -> Self {
        Self {
            phases,
            signal,
            logger,
            options: DeploymentOptions::default(),
        }
    }

    /// Set the options used when deploying the run
    pub fn with_options(mut self, options: DeploymentOptions) -> Self {
        self.options = options;
        self
    }

    /// Deploy the run onto `scheduler`
    ///
    /// Phase failures are never returned here; they reach the gate. A
    /// registration failure is signaled to the gate directly, without running
    /// any phase, and also returned.
    pub fn start(self, scheduler: Arc<dyn Scheduler>) -> BridgeResult<DeploymentId> {
        let LifecycleRunner {
            phases,
            signal,
            logger,
            options,
        } = self;

        let unit_scheduler = scheduler.clone();
        let unit_signal = signal.clone();
        let unit_logger = logger.clone();
        let unit: UnitFactory = Box::new(move |id| {
            Box::pin(async move {
                let completion = drive(&phases, &unit_logger).await;
                report(&unit_logger, &completion);
                if let Err(e) = unit_scheduler.undeploy(&id).await {
                    unit_logger.warn(format!("Failed to retire deployment {}: {}", id, e));
                }
                unit_signal.complete(completion);
            })
        });

        match scheduler.deploy(&options, unit) {
            Ok(id) => {
                logger.debug(format!("Deployed unit with id: {}", id));
                Ok(id)
            }
            Err(e) => {
                let message = match e {
                    BridgeError::Registration(message) => message,
                    other => other.to_string(),
                };
                let cause = BridgeError::Registration(message.clone());
                logger.fatal_with("Deployment failed", &cause);
                signal.complete(Completion::failed(cause));
                Err(BridgeError::Registration(message))
            }
        }
    }
}

/// Run the state machine to a terminal state
async fn drive(phases: &Arc<dyn Phases>, logger: &Logger) -> Completion {
    let mut state = RunState::Prepare;
    let mut execute_result: PhaseResult = Ok(());

    loop {
        match state {
            RunState::Prepare => match run_phase(phases, Phase::Prepare).await {
                Ok(()) => state = transition(state, RunState::Execute, logger),
                Err(cause) => {
                    transition(state, RunState::Failed, logger);
                    return Completion::failed(BridgeError::Prepare(cause));
                }
            },
            RunState::Execute => {
                execute_result = run_phase(phases, Phase::Execute).await;
                state = transition(state, RunState::Finalize, logger);
            }
            RunState::Finalize => {
                let finalize_result = run_phase(phases, Phase::Finalize).await;
                let completion = Completion::from_phases(
                    std::mem::replace(&mut execute_result, Ok(())),
                    finalize_result,
                );
                let terminal = if completion.is_success() {
                    RunState::Completed
                } else {
                    RunState::Failed
                };
                transition(state, terminal, logger);
                return completion;
            }
            terminal @ (RunState::Completed | RunState::Failed) => {
                return Completion::failed(BridgeError::Runtime(format!(
                    "run resumed from terminal state {}",
                    terminal
                )));
            }
        }
    }
}

fn report(logger: &Logger, completion: &Completion) {
    match completion.cause() {
        None => logger.debug("Run succeeded"),
        Some(cause) => logger.fatal_with("Run failed", cause),
    }
}

fn transition(from: RunState, to: RunState, logger: &Logger) -> RunState {
    debug_assert!(from.can_transition_to(to), "{} -> {}", from, to);
    logger.trace(format!("Lifecycle {} -> {}", from, to));
    to
}

/// Run one phase in its own task so a panic becomes that phase's failure
async fn run_phase(phases: &Arc<dyn Phases>, phase: Phase) -> PhaseResult {
    let phases = phases.clone();
    let joined = tokio::spawn(async move {
        match phase {
            Phase::Prepare => phases.prepare().await,
            Phase::Execute => phases.execute().await,
            Phase::Finalize => phases.finalize().await,
        }
    })
    .await;

    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            let payload = e.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(anyhow::anyhow!("{} phase panicked: {}", phase, message))
        }
        Err(e) => Err(anyhow::anyhow!("{} phase was cancelled: {}", phase, e)),
    }
}
