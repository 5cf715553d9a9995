#![allow(non_snake_case)]

use super::*;
use crate::unit::UnitContext;
use async_trait::async_trait;
use loopbridge_core::PhaseResult;
use test_case::test_case;

#[derive(Default)]
struct Nightly;

#[async_trait]
impl InstantUnit for Nightly {
    fn name(&self) -> &str {
        "nightly"
    }

    async fn run(&self, _ctx: &UnitContext) -> PhaseResult {
        Ok(())
    }
}

#[derive(Default)]
struct Cleanup;

#[async_trait]
impl InstantUnit for Cleanup {
    fn name(&self) -> &str {
        "cleanup"
    }

    async fn run(&self, _ctx: &UnitContext) -> PhaseResult {
        Ok(())
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn registry() -> UnitRegistry {
    UnitRegistry::new()
        .register_default::<Nightly>("nightly")
        .register_default::<Cleanup>("cleanup")
}

// target_from_args

#[test_case(&["prog"], &[], Some("prog") ; "program only")]
#[test_case(&["prog", "a", "b"], &["a", "b"], Some("prog") ; "program with tail")]
#[test_case(&["java", "Main", "x"], &["x"], Some("Main") ; "launcher before target")]
#[test_case(&[], &[], None ; "empty command line")]
#[test_case(&["a"], &["a"], None ; "tail covers everything")]
#[test_case(&["a"], &["a", "b"], None ; "tail longer than command line")]
fn target_from_args___cases(full: &[&str], tail: &[&str], expected: Option<&str>) {
    let full = strings(full);
    let tail = strings(tail);

    assert_eq!(target_from_args(&full, &tail), expected);
}

// UnitRegistry

#[test_case("/usr/local/bin/cleanup", "cleanup" ; "absolute path")]
#[test_case("nightly", "nightly" ; "bare name")]
#[test_case("./target/debug/nightly.exe", "nightly" ; "extension stripped")]
fn UnitRegistry___resolve___matches_file_stem(program: &str, expected: &str) {
    let full = strings(&[program, "--verbose"]);
    let tail = strings(&["--verbose"]);

    let unit = registry().resolve(&full, &tail).unwrap();

    assert_eq!(unit.name(), expected);
}

#[test]
fn UnitRegistry___unknown_target___resolution_error() {
    let full = strings(&["/bin/unknown"]);

    let result = registry().resolve(&full, &[]);

    match result {
        Err(BridgeError::Resolution(message)) => assert!(message.contains("unknown")),
        Err(other) => panic!("expected resolution error, got {:?}", other),
        Ok(_) => panic!("expected resolution error"),
    }
}

#[test]
fn UnitRegistry___no_target___resolution_error() {
    let result = registry().resolve(&[], &[]);

    assert!(matches!(result, Err(BridgeError::Resolution(_))));
}

#[test]
fn UnitRegistry___names___sorted() {
    let registry = registry();

    let names: Vec<&str> = registry.names().collect();

    assert_eq!(names, vec!["cleanup", "nightly"]);
}

#[test]
fn UnitRegistry___register_same_name___replaces() {
    let registry = UnitRegistry::new()
        .register("job", || Box::new(Nightly))
        .register("job", || Box::new(Cleanup));

    let unit = registry.create("job").unwrap();

    assert_eq!(unit.name(), "cleanup");
}

// FnResolver

#[test]
fn FnResolver___resolve___ignores_arguments() {
    let resolver = FnResolver::new(|| Box::new(Cleanup) as Box<dyn InstantUnit>);

    let unit = resolver.resolve(&[], &[]).unwrap();

    assert_eq!(unit.name(), "cleanup");
}
