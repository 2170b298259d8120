use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kubegate_common::ErrorBody;
use thiserror::Error;

/// Errors surfaced by the agent's HTTP endpoints
#[derive(Debug, Error)]
pub enum AgentError {
    /// A required query parameter is missing or empty
    #[error("{0}")]
    BadRequest(String),

    /// The Kubernetes API call failed
    #[error("{0}")]
    Kubernetes(String),
}

impl From<kube::Error> for AgentError {
    fn from(e: kube::Error) -> Self {
        AgentError::Kubernetes(e.to_string())
    }
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let status = match &self {
            AgentError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AgentError::Kubernetes(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
