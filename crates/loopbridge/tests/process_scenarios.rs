//! End-to-end runs of a unit through ProcessBootstrap
//!
//! Each test drives a full launch: configuration, event loop creation,
//! deployment, the blocked wait, release and the derived exit status.

use async_trait::async_trait;
use loopbridge::{
    BridgeError, BridgeResult, Completion, ConfigTree, InstantUnit, InterruptToken, LogLevel,
    LoggerFactory, MemoryLoggerFactory, Phase, PhaseResult, ProcessBootstrap, RuntimeConfig,
    UnitContext,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

#[derive(Clone, Copy, PartialEq)]
enum Step {
    Ok,
    Fail,
    Hang,
}

/// Unit whose phases follow a script and record that they ran
struct ScriptedUnit {
    before: Step,
    run: Step,
    after: Step,
    runtime: RuntimeConfig,
    factory: MemoryLoggerFactory,
    calls: Mutex<Vec<Phase>>,
    running: AtomicBool,
}

impl ScriptedUnit {
    fn new(before: Step, run: Step, after: Step) -> Self {
        Self {
            before,
            run,
            after,
            runtime: RuntimeConfig::default(),
            factory: MemoryLoggerFactory::new(),
            calls: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    fn calls(&self) -> Vec<Phase> {
        self.calls.lock().clone()
    }

    async fn step(&self, phase: Phase, step: Step) -> PhaseResult {
        self.calls.lock().push(phase);
        match step {
            Step::Ok => Ok(()),
            Step::Fail => Err(anyhow::anyhow!("{} went wrong", phase)),
            Step::Hang => {
                self.running.store(true, Ordering::SeqCst);
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl InstantUnit for ScriptedUnit {
    fn name(&self) -> &str {
        "scripted"
    }

    fn load_local_configuration(&self, config: &mut ConfigTree) -> BridgeResult<()> {
        config.load_properties_str("scenario=true");
        Ok(())
    }

    fn runtime_config(&self) -> RuntimeConfig {
        self.runtime.clone()
    }

    fn logger_factory(&self) -> Arc<dyn LoggerFactory> {
        Arc::new(self.factory.clone())
    }

    async fn before_run(&self, _ctx: &UnitContext) -> PhaseResult {
        self.step(Phase::Prepare, self.before).await
    }

    async fn run(&self, _ctx: &UnitContext) -> PhaseResult {
        self.step(Phase::Execute, self.run).await
    }

    async fn after_run(&self, _ctx: &UnitContext) -> PhaseResult {
        self.step(Phase::Finalize, self.after).await
    }
}

fn launch(unit: Arc<ScriptedUnit>) -> loopbridge::LaunchReport {
    ProcessBootstrap::from_shared(unit).handle_ctrl_c(false).launch(&[])
}

fn phase_cause(completion: &Completion) -> String {
    completion
        .cause()
        .and_then(|c| c.phase_cause())
        .map(|c| c.to_string())
        .unwrap_or_default()
}

#[test]
fn test_all_phases_succeed() {
    let unit = Arc::new(ScriptedUnit::new(Step::Ok, Step::Ok, Step::Ok));

    let report = launch(unit.clone());

    assert!(report.completion.is_success());
    assert_eq!(report.exit_code, 0);
    assert_eq!(
        unit.calls(),
        vec![Phase::Prepare, Phase::Execute, Phase::Finalize]
    );
    let sink = unit.factory.sink();
    assert_eq!(sink.matching(LogLevel::Debug, "Run succeeded").len(), 1);
    assert_eq!(sink.count(LogLevel::Fatal), 0);
    let release = report.release.expect("event loop should be released");
    assert_eq!(release.undeployed, 0, "unit should retire its own deployment");
}

#[test]
fn test_execute_fails_finalize_succeeds() {
    let unit = Arc::new(ScriptedUnit::new(Step::Ok, Step::Fail, Step::Ok));

    let report = launch(unit.clone());

    assert!(matches!(report.completion.cause(), Some(BridgeError::Execute(_))));
    assert_eq!(phase_cause(&report.completion), "execute went wrong");
    assert_eq!(report.exit_code, 1);
    assert_eq!(
        unit.calls(),
        vec![Phase::Prepare, Phase::Execute, Phase::Finalize]
    );
    let fatal = unit.factory.sink().matching(LogLevel::Fatal, "Run failed");
    assert_eq!(fatal.len(), 1);
    assert!(fatal[0].cause.as_deref().unwrap_or_default().contains("execute went wrong"));
}

#[test]
fn test_execute_succeeds_finalize_fails() {
    let unit = Arc::new(ScriptedUnit::new(Step::Ok, Step::Ok, Step::Fail));

    let report = launch(unit.clone());

    assert!(matches!(report.completion.cause(), Some(BridgeError::Finalize(_))));
    assert_eq!(phase_cause(&report.completion), "finalize went wrong");
    assert_eq!(report.exit_code, 1);
}

#[test]
fn test_both_fail_execute_cause_wins() {
    let unit = Arc::new(ScriptedUnit::new(Step::Ok, Step::Fail, Step::Fail));

    let report = launch(unit.clone());

    assert_eq!(phase_cause(&report.completion), "execute went wrong");
    assert_eq!(report.exit_code, 1);
}

#[test]
fn test_prepare_fails_still_releases_once() {
    let unit = Arc::new(ScriptedUnit::new(Step::Fail, Step::Ok, Step::Ok));

    let report = launch(unit.clone());

    assert!(matches!(report.completion.cause(), Some(BridgeError::Prepare(_))));
    assert_eq!(report.exit_code, 1);
    assert_eq!(unit.calls(), vec![Phase::Prepare]);
    let release = report.release.expect("event loop should be released");
    assert_eq!(release.undeployed, 0);
}

#[test]
fn test_registration_fails_no_phase_runs() {
    let unit = Arc::new(
        ScriptedUnit::new(Step::Ok, Step::Ok, Step::Ok)
            .with_runtime(RuntimeConfig::default().with_max_deployments(0)),
    );

    let report = launch(unit.clone());

    match report.completion.cause() {
        Some(BridgeError::Registration(message)) => {
            assert_eq!(message, "deployment limit of 0 reached")
        }
        other => panic!("expected registration failure, got {:?}", other),
    }
    assert_eq!(report.exit_code, 1);
    assert!(unit.calls().is_empty());
    assert!(report.release.is_some());
}

#[test]
fn test_interrupted_while_execute_pending() {
    let unit = Arc::new(ScriptedUnit::new(Step::Ok, Step::Hang, Step::Ok));
    let token = InterruptToken::new();

    let interrupter = {
        let unit = unit.clone();
        let token = token.clone();
        thread::spawn(move || {
            while !unit.running.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            token.interrupt();
        })
    };

    let report = ProcessBootstrap::from_shared(unit.clone())
        .handle_ctrl_c(false)
        .with_interrupt_token(token)
        .launch(&[]);
    interrupter.join().expect("interrupter thread should finish");

    assert!(matches!(report.completion, Completion::Interrupted));
    assert_eq!(report.exit_code, 1);
    let release = report.release.expect("release should be attempted");
    assert_eq!(release.undeployed, 1, "pending deployment should be aborted");
    assert_eq!(unit.calls(), vec![Phase::Prepare, Phase::Execute]);
    assert_eq!(
        unit.factory.sink().matching(LogLevel::Fatal, "Interrupted").len(),
        1
    );
}
