use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use kubegate_common::ErrorBody;
use thiserror::Error;
use tracing::error;

use crate::auth::TokenError;
use crate::upstream::UpstreamError;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("{0}")]
    BadRequest(String),

    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Metrics error: {0}")]
    MetricsError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Unauthorized(_)
            | GatewayError::Token(_)
            | GatewayError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::ClusterNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Upstream(_)
            | GatewayError::MetricsError(_)
            | GatewayError::ConfigError(_)
            | GatewayError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(ErrorBody::new(self.to_string()));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
