//! Request router
//!
//! Resolves a cluster name through the [`ClusterRegistry`], performs one
//! bounded call to that cluster's agent through an [`AgentTransport`], and
//! turns the outcome into either a JSON value or a [`GatewayError`].
//!
//! Authentication happens before any of this, at the HTTP boundary. The
//! router holds no mutable state; every call is independent.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kubegate_common::RestartResponse;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use crate::metrics::GatewayMetrics;
use crate::registry::ClusterRegistry;
use crate::upstream::{endpoint, AgentRequest, AgentTransport, Operation};
use crate::Result;

/// Per-operation bounds on outbound calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub list: Duration,
    /// Restart patches the control plane, so it gets longer
    pub restart: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            list: Duration::from_secs(5),
            restart: Duration::from_secs(10),
        }
    }
}

impl Timeouts {
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Namespaces | Operation::Deployments => self.list,
            Operation::Restart => self.restart,
        }
    }
}

pub struct Aggregator {
    registry: Arc<ClusterRegistry>,
    transport: Arc<dyn AgentTransport>,
    metrics: GatewayMetrics,
    timeouts: Timeouts,
}

impl Aggregator {
    pub fn new(
        registry: Arc<ClusterRegistry>,
        transport: Arc<dyn AgentTransport>,
        metrics: GatewayMetrics,
    ) -> Self {
        Self {
            registry,
            transport,
            metrics,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn registry(&self) -> &ClusterRegistry {
        &self.registry
    }

    /// Names of all configured clusters. Never calls an agent.
    pub fn list_clusters(&self) -> Vec<String> {
        self.registry.names()
    }

    pub async fn list_namespaces(&self, cluster: &str) -> Result<Value> {
        let base = self.registry.resolve(cluster)?;
        let url = endpoint(base, &["namespaces"])?;
        self.dispatch(cluster, Operation::Namespaces, url).await
    }

    pub async fn list_deployments(&self, cluster: &str, namespace: &str) -> Result<Value> {
        let base = self.registry.resolve(cluster)?;
        let url = endpoint(base, &["deployments", namespace])?;
        self.dispatch(cluster, Operation::Deployments, url).await
    }

    /// Force a rolling restart of `deployment`. Not idempotent: every call
    /// reaches the agent and triggers a new rollout.
    pub async fn restart(
        &self,
        cluster: &str,
        namespace: &str,
        deployment: &str,
    ) -> Result<RestartResponse> {
        let base = self.registry.resolve(cluster)?;
        let mut url = endpoint(base, &["restart"])?;
        url.query_pairs_mut()
            .append_pair("namespace", namespace)
            .append_pair("deployment_name", deployment);

        let body = self.dispatch(cluster, Operation::Restart, url).await?;

        Ok(serde_json::from_value(body)
            .unwrap_or_else(|_| RestartResponse::success(namespace, deployment)))
    }

    async fn dispatch(&self, cluster: &str, operation: Operation, url: Url) -> Result<Value> {
        let request = AgentRequest {
            operation,
            url,
            timeout: self.timeouts.for_operation(operation),
        };
        debug!(
            cluster,
            operation = %operation,
            url = %request.url,
            "Dispatching to agent"
        );

        let started = Instant::now();
        let result = self.transport.get(request).await;
        self.metrics
            .record_upstream(cluster, operation, result.is_ok(), started.elapsed());

        result.map_err(|e| {
            warn!(cluster, operation = %operation, "Agent call failed: {}", e);
            e.into()
        })
    }
}
