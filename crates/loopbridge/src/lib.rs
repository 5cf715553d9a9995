//! # loopbridge
//!
//! Run asynchronous lifecycles on a Tokio event loop from ordinary blocking
//! entry points: a `main` function or a `#[test]` function.
//!
//! loopbridge provides:
//! - [`ProcessBootstrap`] to host one [`InstantUnit`] per process and exit
//!   with a status derived from its outcome
//! - [`UnitResolver`] implementations for picking the unit from the command line
//! - [`FixtureScope`] / [`TestFixture`] sharing one event loop across tests
//! - [`TestContext`] / [`Checkpoint`] for awaiting asynchronous test outcomes
//!
//! ## Running a unit
//!
//! ```ignore
//! use loopbridge::prelude::*;
//!
//! #[derive(Default)]
//! struct Cleanup;
//!
//! #[async_trait]
//! impl InstantUnit for Cleanup {
//!     async fn run(&self, ctx: &UnitContext) -> PhaseResult {
//!         let days: u32 = ctx.config().get_parsed("cleanup.retention_days").unwrap_or(30);
//!         ctx.logger().info(format!("Removing entries older than {} days", days));
//!         tokio::time::sleep(std::time::Duration::from_millis(10)).await;
//!         Ok(())
//!     }
//! }
//!
//! fn main() {
//!     let args: Vec<String> = std::env::args().skip(1).collect();
//!     ProcessBootstrap::new(Cleanup).exit(&args)
//! }
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`loopbridge_core`] - Errors, completion signal, lifecycle states, configuration
//! - [`loopbridge_logging`] - Logger handles and factories
//! - [`loopbridge_runtime`] - Event loop, scheduler, completion gate, lifecycle runner

mod fixture;
mod process;
mod resolver;
mod testkit;
mod unit;

pub use fixture::{DefaultHooks, FixtureHooks, FixtureScope, TestFixture};
pub use process::{LaunchReport, ProcessBootstrap, run_main};
pub use resolver::{FnResolver, UnitRegistry, UnitResolver, target_from_args};
pub use testkit::{Checkpoint, TestContext};
pub use unit::{InstantUnit, UnitContext};

// Re-export core types
pub use loopbridge_core::{
    BridgeError, BridgeResult, Completion, ConfigTree, EXIT_FAILURE, EXIT_SUCCESS, LogLevel,
    Phase, PhaseResult, RunState,
};

pub use loopbridge_logging::{
    Logger, LoggerFactory, MemoryLoggerFactory, MemorySink, TracingLoggerFactory, init_logging,
};

pub use loopbridge_runtime::{
    CompletionGate, DeploymentOptions, EventLoop, InterruptToken, ReleaseReport, RuntimeConfig,
};

// Re-export common dependencies that unit authors need
pub use anyhow;
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;

/// Prelude module for convenient imports.
///
/// Use `use loopbridge::prelude::*;` to import commonly used types.
pub mod prelude {
    pub use crate::{
        BridgeError, BridgeResult, Checkpoint, ConfigTree, FixtureScope, InstantUnit, LogLevel,
        PhaseResult, ProcessBootstrap, RuntimeConfig, TestContext, TestFixture, UnitContext,
        UnitRegistry, async_trait,
    };

    pub use std::time::Duration;
}
