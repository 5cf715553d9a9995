//! Choosing which unit a process runs

use crate::unit::InstantUnit;
use loopbridge_core::{BridgeError, BridgeResult};
use std::collections::BTreeMap;
use std::path::Path;

/// Picks the unit to run from the process arguments
pub trait UnitResolver {
    /// Resolve a unit
    ///
    /// `full_args` is the whole command line, program name included;
    /// `tail_args` is the trailing slice passed on to the unit.
    fn resolve(&self, full_args: &[String], tail_args: &[String]) -> BridgeResult<Box<dyn InstantUnit>>;
}

/// The argument just before the trailing `tail` arguments
///
/// With `tail` being everything after the program name this is the program
/// path itself, which lets one binary installed under several names run a
/// different unit per name.
pub fn target_from_args<'a>(full: &'a [String], tail: &[String]) -> Option<&'a str> {
    let index = full.len().checked_sub(tail.len())?.checked_sub(1)?;
    full.get(index).map(String::as_str)
}

type Factory = Box<dyn Fn() -> Box<dyn InstantUnit> + Send + Sync>;

/// Resolves units by name
///
/// The target argument is matched by file stem, so `/usr/local/bin/cleanup`
/// and `cleanup.exe` both resolve the unit registered as `cleanup`.
#[derive(Default)]
pub struct UnitRegistry {
    factories: BTreeMap<String, Factory>,
}

impl UnitRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn InstantUnit> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Register a unit built with [`Default`]
    pub fn register_default<U>(self, name: impl Into<String>) -> Self
    where
        U: InstantUnit + Default,
    {
        self.register(name, || Box::new(U::default()))
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the unit registered under `name`
    pub fn create(&self, name: &str) -> BridgeResult<Box<dyn InstantUnit>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| BridgeError::Resolution(format!("no unit registered as '{}'", name)))
    }
}

impl UnitResolver for UnitRegistry {
    fn resolve(&self, full_args: &[String], tail_args: &[String]) -> BridgeResult<Box<dyn InstantUnit>> {
        let target = target_from_args(full_args, tail_args).ok_or_else(|| {
            BridgeError::Resolution("no target found in process arguments".to_string())
        })?;
        let name = Path::new(target)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| BridgeError::Resolution(format!("invalid target '{}'", target)))?;
        self.create(name)
    }
}

/// Resolver for binaries that always run the same unit
pub struct FnResolver<F>(F);

impl<F> FnResolver<F>
where
    F: Fn() -> Box<dyn InstantUnit>,
{
    /// Resolve every invocation through `factory`
    pub fn new(factory: F) -> Self {
        Self(factory)
    }
}

impl<F> UnitResolver for FnResolver<F>
where
    F: Fn() -> Box<dyn InstantUnit>,
{
    fn resolve(&self, _full_args: &[String], _tail_args: &[String]) -> BridgeResult<Box<dyn InstantUnit>> {
        Ok((self.0)())
    }
}

#[cfg(test)]
#[path = "resolver/resolver_tests.rs"]
mod resolver_tests;
