//! Workload operations against a single cluster's control plane
//!
//! The [`Workloads`] trait is the seam between the HTTP handlers and the
//! Kubernetes API, so handlers can be exercised without a cluster.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::Client;
use kubegate_common::RESTART_ANNOTATION;
use log::{debug, info};
use serde_json::{json, Value};

use crate::error::AgentError;

/// Read and restart operations the agent exposes
#[async_trait]
pub trait Workloads: Send + Sync {
    /// Names of all namespaces in the cluster
    async fn namespaces(&self) -> Result<Vec<String>, AgentError>;

    /// Names of the deployments in `namespace`
    async fn deployments(&self, namespace: &str) -> Result<Vec<String>, AgentError>;

    /// Trigger a rolling restart of `deployment`, stamped with `at`
    async fn restart(
        &self,
        namespace: &str,
        deployment: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AgentError>;
}

/// [`Workloads`] backed by the Kubernetes API
pub struct KubeWorkloads {
    client: Client,
}

impl KubeWorkloads {
    /// Connect using in-cluster config, falling back to the local kubeconfig
    pub async fn try_default() -> Result<Self, AgentError> {
        debug!("Initializing Kubernetes client");

        let client = Client::try_default().await.map_err(|e| {
            AgentError::Kubernetes(format!("Failed to create Kubernetes client: {}", e))
        })?;

        info!("Connected to Kubernetes cluster");

        Ok(Self { client })
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Workloads for KubeWorkloads {
    async fn namespaces(&self) -> Result<Vec<String>, AgentError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    async fn deployments(&self, namespace: &str) -> Result<Vec<String>, AgentError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|d| d.metadata.name)
            .collect())
    }

    async fn restart(
        &self,
        namespace: &str,
        deployment: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AgentError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        api.patch(
            deployment,
            &PatchParams::default(),
            &Patch::Merge(restart_patch(at)),
        )
        .await?;

        info!("Restarted deployment {}/{}", namespace, deployment);
        Ok(())
    }
}

/// Merge patch that bumps the pod template's restart annotation, which makes
/// the deployment controller roll every pod
pub fn restart_patch(at: DateTime<Utc>) -> Value {
    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": {
                        RESTART_ANNOTATION: at.to_rfc3339_opts(SecondsFormat::Micros, true)
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_restart_patch_sets_annotation() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let patch = restart_patch(at);

        assert_eq!(
            patch["spec"]["template"]["metadata"]["annotations"][RESTART_ANNOTATION],
            "2024-06-01T12:30:00.000000Z"
        );
    }

    #[test]
    fn test_restart_patch_changes_with_time() {
        let first = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let second = first + chrono::Duration::seconds(1);

        assert_ne!(restart_patch(first), restart_patch(second));
    }

    #[test]
    fn test_restarts_within_one_second_differ() {
        let first = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let second = first + chrono::Duration::milliseconds(400);

        assert_ne!(restart_patch(first), restart_patch(second));
        assert_eq!(
            restart_patch(second)["spec"]["template"]["metadata"]["annotations"]
                [RESTART_ANNOTATION],
            "2024-06-01T12:30:00.400000Z"
        );
    }
}
