pub mod extract;
pub mod handlers;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::audit::AuditSink;
use crate::auth::{Authenticator, CredentialStore, TokenService};
use crate::config::Config;
use crate::metrics::GatewayMetrics;
use crate::registry::ClusterRegistry;
use crate::router::Aggregator;
use crate::upstream::HttpAgentClient;
use crate::{GatewayError, Result};

/// Everything a request handler needs. Built once, never mutated.
pub struct AppState {
    pub auth: Authenticator,
    pub aggregator: Aggregator,
    pub audit: AuditSink,
    pub metrics: GatewayMetrics,
}

impl AppState {
    /// Load the credential store and cluster registry and wire the services
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let credentials = CredentialStore::load(&config.users_file)?;
        let registry = ClusterRegistry::load(&config.clusters_file)?;
        let metrics = GatewayMetrics::new()?;
        let audit = AuditSink::stdout();

        let aggregator = Aggregator::new(
            Arc::new(registry),
            Arc::new(HttpAgentClient::new()?),
            metrics.clone(),
        )
        .with_timeouts(config.timeouts);

        let auth = Authenticator::new(
            credentials,
            TokenService::new(config.secret.as_bytes(), config.token_ttl),
            audit.clone(),
        );

        Ok(Self {
            auth,
            aggregator,
            audit,
            metrics,
        })
    }
}

/// Routes of the gateway, without CORS
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/log", post(handlers::log_event))
        .route("/clusters", get(handlers::list_clusters))
        .route("/namespaces/{cluster}", get(handlers::list_namespaces))
        .route(
            "/deployments/{cluster}/{namespace}",
            get(handlers::list_deployments),
        )
        .route("/restart", get(handlers::restart))
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).map_err(|e| {
                GatewayError::ConfigError(format!("Invalid CORS origin {}: {}", o, e))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true))
}

/// Serve the gateway until Ctrl-C
pub async fn serve(config: Config) -> Result<()> {
    let state = Arc::new(AppState::from_config(&config)?);
    let app = router(state).layer(cors_layer(&config.cors_origins)?);

    let listener = TcpListener::bind(config.listen).await?;
    info!("kubegate listening on {}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("kubegate stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
