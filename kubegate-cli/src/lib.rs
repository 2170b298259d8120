//! Client library for the kubegate aggregator
//!
//! Wraps the aggregator's HTTP API:
//! - `login` exchanges a username/password for a bearer token
//! - `clusters`, `namespaces`, `deployments`, `restart` call the protected
//!   routes with that token
//! - `log_event` forwards an audit event, best-effort

use chrono::{SecondsFormat, Utc};
use kubegate_common::{ErrorBody, EventPayload, LogEvent, RestartResponse, TokenResponse};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid server URL {0}")]
    InvalidServer(String),

    #[error("Not logged in. Run `kubegatectl login` and export KUBEGATE_TOKEN")]
    NoToken,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The aggregator answered with an error status
    #[error("{status}: {detail}")]
    Api { status: u16, detail: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

pub struct GatewayClient {
    http: reqwest::Client,
    server: Url,
    token: Option<String>,
    user: String,
}

impl GatewayClient {
    pub fn new(server: &str, token: Option<String>, user: impl Into<String>) -> Result<Self> {
        let server = Url::parse(server).map_err(|_| ClientError::InvalidServer(server.to_string()))?;
        if server.cannot_be_a_base() {
            return Err(ClientError::InvalidServer(server.to_string()));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            server,
            token: token.filter(|t| !t.is_empty()),
            user: user.into(),
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Log in and keep the issued token for subsequent calls
    pub async fn login(&mut self, username: &str, password: &str) -> Result<TokenResponse> {
        let response = self
            .http
            .post(self.url(&["login"]))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let token: TokenResponse = decode(response).await?;
        self.token = Some(token.access_token.clone());
        self.user = username.to_string();
        Ok(token)
    }

    pub async fn clusters(&self) -> Result<Vec<String>> {
        self.get(&["clusters"]).await
    }

    pub async fn namespaces(&self, cluster: &str) -> Result<Vec<String>> {
        self.get(&["namespaces", cluster]).await
    }

    pub async fn deployments(&self, cluster: &str, namespace: &str) -> Result<Vec<String>> {
        self.get(&["deployments", cluster, namespace]).await
    }

    pub async fn restart(
        &self,
        cluster: &str,
        namespace: &str,
        deployment: &str,
    ) -> Result<RestartResponse> {
        let request = self.http.get(self.url(&["restart"])).query(&[
            ("cluster", cluster),
            ("namespace", namespace),
            ("deployment_name", deployment),
        ]);
        decode(self.authorized(request)?.send().await?).await
    }

    /// Forward an audit event. Skipped without a token; failures are ignored.
    pub async fn log_event(&self, level: &str, event: &str, details: Map<String, Value>) {
        let Some(token) = self.token() else {
            return;
        };

        let entry = LogEvent {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: level.to_string(),
            user: self.user.clone(),
            event: Some(EventPayload::from(event)),
            details: Some(details),
        };

        let _ = self
            .http
            .post(self.url(&["log"]))
            .bearer_auth(token)
            .json(&entry)
            .send()
            .await;
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let request = self.http.get(self.url(segments));
        decode(self.authorized(request)?.send().await?).await
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token().ok_or(ClientError::NoToken)?;
        Ok(request.bearer_auth(token))
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.server.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.detail)
        .unwrap_or(text);

    Err(ClientError::Api {
        status: status.as_u16(),
        detail,
    })
}

/// Truncate `s` to at most `max_len` characters, marking the cut with `...`
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
