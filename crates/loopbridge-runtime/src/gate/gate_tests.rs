#![allow(non_snake_case)]

use super::*;
use std::sync::Barrier;
use std::thread;

// CompletionGate tests

#[test]
fn CompletionGate___new___not_signaled() {
    let gate = CompletionGate::new();

    assert!(!gate.is_signaled());
}

#[test]
fn CompletionGate___signal_then_wait___returns_immediately() {
    let gate = CompletionGate::new();

    gate.signal_success();
    let completion = gate.wait();

    assert!(completion.is_success());
}

#[test]
fn CompletionGate___success_then_failure___first_wins() {
    let gate = CompletionGate::new();

    let first = gate.signal_success();
    let second = gate.signal_failure(BridgeError::Registration("late".into()));

    assert!(first);
    assert!(!second);
    assert!(gate.wait().is_success());
}

#[test]
fn CompletionGate___failure_then_success___failure_kept() {
    let gate = CompletionGate::new();

    gate.signal_failure(BridgeError::Execute(anyhow::anyhow!("E")));
    gate.signal_success();

    let completion = gate.wait();
    assert!(matches!(completion.cause(), Some(BridgeError::Execute(_))));
}

#[test]
fn CompletionGate___wait___wakes_on_signal_from_other_thread() {
    let gate = CompletionGate::new();
    let signal = gate.signaler();

    let signaler = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        signal.signal_failure(BridgeError::Finalize(anyhow::anyhow!("F")))
    });
    let completion = gate.wait();

    assert!(signaler.join().unwrap());
    assert!(matches!(completion.cause(), Some(BridgeError::Finalize(_))));
}

#[test]
fn CompletionGate___wait___signal_from_event_loop_task() {
    let gate = CompletionGate::new();
    let signal = gate.signaler();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .unwrap();

    runtime.spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.signal_success();
    });

    assert!(gate.wait().is_success());
}

#[test]
fn CompletionGate___wait___repeatable_after_signal() {
    let gate = CompletionGate::new();
    gate.signal_success();

    assert!(gate.wait().is_success());
    assert!(gate.wait().is_success());
}

#[test]
fn CompletionGate___wait_timeout___elapses_without_signal() {
    let gate = CompletionGate::new();

    let completion = gate.wait_timeout(Duration::from_millis(20));

    assert!(completion.is_none());
}

#[test]
fn CompletionGate___wait_timeout___returns_signal() {
    let gate = CompletionGate::new();
    let signal = gate.signaler();

    thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        signal.signal_success();
    });

    let completion = gate.wait_timeout(Duration::from_secs(5));
    assert!(completion.unwrap().is_success());
}

#[test]
fn CompletionGate___concurrent_signals___exactly_one_wins() {
    let gate = CompletionGate::new();
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let signal = gate.signaler();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                if i % 2 == 0 {
                    signal.signal_success()
                } else {
                    signal.signal_failure(BridgeError::Execute(anyhow::anyhow!("{}", i)))
                }
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert!(gate.is_signaled());
}

// GateSignal tests

#[test]
fn GateSignal___clone___signals_same_gate() {
    let gate = CompletionGate::new();
    let a = gate.signaler();
    let b = a.clone();

    assert!(b.complete(Completion::Succeeded));
    assert!(a.is_signaled());
    assert!(!a.signal_success());
}

// InterruptToken tests

#[test]
fn InterruptToken___interrupt___completes_waiting_gate() {
    let token = InterruptToken::new();
    let gate = CompletionGate::with_interrupt(&token);

    let interrupter = token.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        interrupter.interrupt();
    });

    assert!(matches!(gate.wait(), Completion::Interrupted));
    assert!(token.is_interrupted());
}

#[test]
fn InterruptToken___interrupt_after_signal___signal_kept() {
    let token = InterruptToken::new();
    let gate = CompletionGate::with_interrupt(&token);

    gate.signal_success();
    token.interrupt();

    assert!(gate.wait().is_success());
}

#[test]
fn InterruptToken___signal_after_interrupt___ignored() {
    let token = InterruptToken::new();
    let gate = CompletionGate::with_interrupt(&token);

    token.interrupt();
    let accepted = gate.signal_success();

    assert!(!accepted);
    assert!(matches!(gate.wait(), Completion::Interrupted));
}

#[test]
fn InterruptToken___interrupted_before_attach___gate_interrupted() {
    let token = InterruptToken::new();
    token.interrupt();

    let gate = CompletionGate::with_interrupt(&token);

    assert!(matches!(gate.wait(), Completion::Interrupted));
}

#[test]
fn InterruptToken___interrupt___reaches_every_attached_gate() {
    let token = InterruptToken::new();
    let a = CompletionGate::with_interrupt(&token);
    let b = CompletionGate::with_interrupt(&token);

    token.interrupt();
    token.interrupt();

    assert!(matches!(a.wait(), Completion::Interrupted));
    assert!(matches!(b.wait(), Completion::Interrupted));
}

#[test]
fn InterruptToken___dropped_gate___interrupt_still_safe() {
    let token = InterruptToken::new();
    drop(CompletionGate::with_interrupt(&token));

    token.interrupt();

    assert!(token.is_interrupted());
}
