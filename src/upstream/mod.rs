pub mod client;

pub use client::HttpAgentClient;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

/// Agent endpoints the aggregator calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Namespaces,
    Deployments,
    Restart,
}

impl Operation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::Namespaces => "namespaces",
            Operation::Deployments => "deployments",
            Operation::Restart => "restart",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One outbound call to an agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRequest {
    pub operation: Operation,
    pub url: Url,
    pub timeout: Duration,
}

/// Failure of an outbound agent call, surfaced verbatim to the client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Agent request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Agent request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Agent returned {status} for {url}")]
    Status { url: String, status: String },

    #[error("Agent returned invalid JSON from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Agent address {0} cannot be used as a base URL")]
    InvalidBase(String),
}

/// Transport used to reach agents. A single attempt per call; no retries.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn get(&self, request: AgentRequest) -> Result<Value, UpstreamError>;
}

/// Append path segments to an agent base address. Segments are
/// percent-encoded, so a namespace can never escape its path position.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, UpstreamError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| UpstreamError::InvalidBase(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
