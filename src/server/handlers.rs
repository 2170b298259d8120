use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use kubegate_common::{Ack, LogEvent, RestartResponse, TokenResponse};
use serde::Deserialize;
use serde_json::Value;

use super::extract::{Caller, LoginForm};
use super::AppState;
use crate::{GatewayError, Result};

pub async fn login(
    State(state): State<Arc<AppState>>,
    LoginForm(body): LoginForm,
) -> Result<Json<TokenResponse>> {
    let (username, password) = body
        .into_parts()
        .ok_or_else(|| GatewayError::BadRequest("username & password required".to_string()))?;

    let result = state.auth.login(&username, &password);
    state.metrics.record_login(result.is_ok());

    Ok(Json(TokenResponse::bearer(result?)))
}

pub async fn log_event(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    event: std::result::Result<Json<LogEvent>, JsonRejection>,
) -> Result<Json<Ack>> {
    let Json(event) = event.map_err(|e| GatewayError::BadRequest(e.body_text()))?;

    state.audit.emit(&event, &caller)?;
    Ok(Json(Ack::ok()))
}

pub async fn list_clusters(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
) -> Json<Vec<String>> {
    Json(state.aggregator.list_clusters())
}

pub async fn list_namespaces(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path(cluster): Path<String>,
) -> Result<Json<Value>> {
    state.aggregator.list_namespaces(&cluster).await.map(Json)
}

pub async fn list_deployments(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path((cluster, namespace)): Path<(String, String)>,
) -> Result<Json<Value>> {
    state
        .aggregator
        .list_deployments(&cluster, &namespace)
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct RestartParams {
    pub cluster: String,
    pub namespace: String,
    pub deployment_name: String,
}

pub async fn restart(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    params: std::result::Result<Query<RestartParams>, QueryRejection>,
) -> Result<Json<RestartResponse>> {
    let Query(params) = params.map_err(|e| GatewayError::BadRequest(e.body_text()))?;

    tracing::info!(
        "{} requested restart of {}/{} on {}",
        caller,
        params.namespace,
        params.deployment_name,
        params.cluster
    );

    state
        .aggregator
        .restart(&params.cluster, &params.namespace, &params.deployment_name)
        .await
        .map(Json)
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let body = state.metrics.render()?;
    Ok(([(CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
