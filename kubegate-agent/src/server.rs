//! HTTP server for the agent
//!
//! Exposes the workload operations the aggregator calls. The agent has no
//! authentication of its own: anyone who can reach it can operate on its
//! cluster, so it must only be reachable from the aggregator.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use kubegate_common::RestartResponse;
use log::{error, info};
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::error::AgentError;
use crate::workloads::Workloads;

type SharedWorkloads = Arc<dyn Workloads>;

/// Build the agent's routes over a [`Workloads`] implementation
pub fn router(workloads: SharedWorkloads) -> Router {
    Router::new()
        .route("/namespaces", get(list_namespaces))
        .route("/deployments/{namespace}", get(list_deployments))
        .route("/restart", get(restart))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(workloads)
}

async fn list_namespaces(
    State(workloads): State<SharedWorkloads>,
) -> Result<Json<Vec<String>>, AgentError> {
    workloads.namespaces().await.map(Json).map_err(|e| {
        error!("Failed to list namespaces: {}", e);
        e
    })
}

async fn list_deployments(
    State(workloads): State<SharedWorkloads>,
    Path(namespace): Path<String>,
) -> Result<Json<Vec<String>>, AgentError> {
    workloads.deployments(&namespace).await.map(Json).map_err(|e| {
        error!("Failed to list deployments in {}: {}", namespace, e);
        e
    })
}

/// Query of `/restart`. Fields are optional so a missing one is reported as
/// a bad request with a readable message.
#[derive(Debug, Deserialize)]
struct RestartQuery {
    namespace: Option<String>,
    deployment_name: Option<String>,
}

async fn restart(
    State(workloads): State<SharedWorkloads>,
    Query(query): Query<RestartQuery>,
) -> Result<Json<RestartResponse>, AgentError> {
    let (namespace, deployment) = match (query.namespace, query.deployment_name) {
        (Some(ns), Some(name)) if !ns.is_empty() && !name.is_empty() => (ns, name),
        _ => {
            return Err(AgentError::BadRequest(
                "namespace & deployment_name required".to_string(),
            ))
        }
    };

    workloads
        .restart(&namespace, &deployment, Utc::now())
        .await
        .map_err(|e| {
            error!("Failed to restart {}/{}: {}", namespace, deployment, e);
            e
        })?;

    Ok(Json(RestartResponse::success(&namespace, &deployment)))
}

/// Serve the agent on `addr` until Ctrl-C
pub async fn start_server(workloads: SharedWorkloads, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Agent listening on {}", addr);

    axum::serve(listener, router(workloads))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await?;

    Ok(())
}
