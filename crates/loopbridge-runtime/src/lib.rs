//! loopbridge-runtime - Tokio event loop and the blocking bridge onto it
//!
//! This crate provides:
//! - [`EventLoop`] owning the Tokio runtime, created and released once
//! - [`Scheduler`] / [`LoopScheduler`] for deploying units onto the loop
//! - [`CompletionGate`] for blocking a thread until the loop reports back
//! - [`LifecycleRunner`] driving prepare, execute and finalize

mod gate;
mod runner;
mod runtime;
mod scheduler;
mod shutdown;

pub use gate::{CompletionGate, GateSignal, InterruptToken};
pub use runner::{LifecycleRunner, Phases};
pub use runtime::{EventLoop, ReleaseReport, RuntimeConfig};
pub use scheduler::{
    DeploymentId, DeploymentOptions, LoopScheduler, Scheduler, UnitFactory, UnitFuture,
};
pub use shutdown::{ShutdownHandle, ShutdownSignal};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CompletionGate, DeploymentOptions, EventLoop, InterruptToken, LifecycleRunner, Phases,
        RuntimeConfig, Scheduler,
    };
}
