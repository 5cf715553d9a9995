//! Deployment of units onto the event loop

use crate::shutdown::ShutdownSignal;
use async_trait::async_trait;
use dashmap::DashMap;
use loopbridge_core::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Future executed by a deployed unit
pub type UnitFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Builds a unit's future once its deployment id is known
pub type UnitFactory = Box<dyn FnOnce(DeploymentId) -> UnitFuture + Send + 'static>;

/// Identifier of a deployed unit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeploymentId(String);

impl DeploymentId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DeploymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options for deploying a unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentOptions {
    /// Human-readable name used in logs
    #[serde(default)]
    pub name: Option<String>,
}

impl DeploymentOptions {
    /// Options with no deployment name
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deployment name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Registers and deregisters units on an event loop
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Register a unit; its future starts once registration has completed
    fn deploy(&self, options: &DeploymentOptions, unit: UnitFactory) -> BridgeResult<DeploymentId>;

    /// Deregister a unit, aborting it if it is still running
    ///
    /// A unit may undeploy itself from inside its own future; in that case
    /// the registration is removed and the unit keeps running to its end.
    async fn undeploy(&self, id: &DeploymentId) -> BridgeResult<()>;
}

struct Deployment {
    name: Option<String>,
    task: JoinHandle<()>,
}

/// Scheduler backed by an [`EventLoop`](crate::EventLoop)'s Tokio runtime
#[derive(Clone)]
pub struct LoopScheduler {
    handle: tokio::runtime::Handle,
    deployments: Arc<DashMap<DeploymentId, Deployment>>,
    shutdown: ShutdownSignal,
    max_deployments: Option<usize>,
}

impl LoopScheduler {
    pub(crate) fn new(
        handle: tokio::runtime::Handle,
        shutdown: ShutdownSignal,
        max_deployments: Option<usize>,
    ) -> Self {
        Self {
            handle,
            deployments: Arc::new(DashMap::new()),
            shutdown,
            max_deployments,
        }
    }

    /// Number of currently registered deployments
    pub fn deployment_count(&self) -> usize {
        self.deployments.len()
    }

    /// Check if a deployment is registered
    pub fn is_deployed(&self, id: &DeploymentId) -> bool {
        self.deployments.contains_key(id)
    }

    /// Undeploy every registered unit, returning how many were removed
    pub async fn undeploy_all(&self) -> usize {
        let ids: Vec<DeploymentId> = self.deployments.iter().map(|e| e.key().clone()).collect();
        let mut undeployed = 0;
        for id in ids {
            match self.undeploy(&id).await {
                Ok(()) => undeployed += 1,
                // Retired concurrently
                Err(BridgeError::UnknownDeployment(_)) => {}
                Err(e) => tracing::warn!(deployment = %id, "Undeploy failed: {}", e),
            }
        }
        undeployed
    }
}

#[async_trait]
impl Scheduler for LoopScheduler {
    fn deploy(&self, options: &DeploymentOptions, unit: UnitFactory) -> BridgeResult<DeploymentId> {
        if self.shutdown.is_triggered() {
            return Err(BridgeError::Registration(
                "event loop is shutting down".to_string(),
            ));
        }
        if let Some(max) = self.max_deployments
            && self.deployments.len() >= max
        {
            return Err(BridgeError::Registration(format!(
                "deployment limit of {} reached",
                max
            )));
        }

        let id = DeploymentId::new();
        let future = unit(id.clone());

        // Hold the unit back until its entry exists, so it can always find
        // itself when undeploying
        let (registered_tx, registered_rx) = oneshot::channel::<()>();
        let task = self.handle.spawn(async move {
            if registered_rx.await.is_ok() {
                future.await;
            }
        });

        self.deployments.insert(
            id.clone(),
            Deployment {
                name: options.name.clone(),
                task,
            },
        );
        let _ = registered_tx.send(());

        tracing::debug!(deployment = %id, name = ?options.name, "Deployed unit");
        Ok(id)
    }

    async fn undeploy(&self, id: &DeploymentId) -> BridgeResult<()> {
        let (_, deployment) = self
            .deployments
            .remove(id)
            .ok_or_else(|| BridgeError::UnknownDeployment(id.to_string()))?;

        tracing::debug!(deployment = %id, name = ?deployment.name, "Undeploying unit");

        if tokio::task::try_id() == Some(deployment.task.id()) {
            return Ok(());
        }

        deployment.task.abort();
        match deployment.task.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(BridgeError::Runtime(format!(
                "deployment {} panicked: {}",
                id, e
            ))),
        }
    }
}
