#![allow(non_snake_case)]

use super::*;
use std::error::Error as _;

#[test]
fn BridgeError___registration___returns_code_2() {
    let err = BridgeError::Registration("scheduler closed".into());

    let code = err.error_code();

    assert_eq!(code, 2);
}

#[test]
fn BridgeError___execute___displays_cause_chain() {
    let cause = anyhow::anyhow!("disk full").context("writing report");
    let err = BridgeError::Execute(cause);

    let display = err.to_string();

    assert_eq!(display, "execute phase failed: writing report: disk full");
}

#[test]
fn BridgeError___config_load___displays_path() {
    let err = BridgeError::ConfigLoad {
        path: PathBuf::from("config.properties"),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
    };

    let display = err.to_string();

    assert_eq!(
        display,
        "failed to load configuration from config.properties: not found"
    );
}

#[test]
fn BridgeError___config_load___exposes_io_source() {
    let err = BridgeError::ConfigLoad {
        path: PathBuf::from("missing.properties"),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
    };

    let source = err.source();

    assert!(source.is_some());
}

#[test]
fn BridgeError___finalize___exposes_phase_cause() {
    let err = BridgeError::Finalize(anyhow::anyhow!("cleanup failed"));

    let cause = err.phase_cause().unwrap();

    assert_eq!(cause.to_string(), "cleanup failed");
}

#[test]
fn BridgeError___interrupted___has_no_phase_cause() {
    let err = BridgeError::Interrupted;

    assert!(err.phase_cause().is_none());
    assert!(!err.is_phase_failure());
}

#[test]
fn BridgeError___all_variants___have_unique_codes() {
    let errors = vec![
        BridgeError::ConfigLoad {
            path: PathBuf::new(),
            source: std::io::Error::other("x"),
        },
        BridgeError::Registration("".into()),
        BridgeError::Prepare(anyhow::anyhow!("")),
        BridgeError::Execute(anyhow::anyhow!("")),
        BridgeError::Finalize(anyhow::anyhow!("")),
        BridgeError::Interrupted,
        BridgeError::Resolution("".into()),
        BridgeError::Runtime("".into()),
        BridgeError::UnknownDeployment("".into()),
        BridgeError::Timeout,
        BridgeError::TestFailure("".into()),
    ];

    let mut codes: Vec<u32> = errors.iter().map(|e| e.error_code()).collect();
    let count = codes.len();
    codes.sort_unstable();
    codes.dedup();

    assert_eq!(codes.len(), count, "error codes must be unique");
}
