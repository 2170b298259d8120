use std::error::Error as _;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{AgentRequest, AgentTransport, UpstreamError};
use crate::{GatewayError, Result};

/// Reaches agents over plain HTTP(S) with reqwest
#[derive(Clone)]
pub struct HttpAgentClient {
    client: reqwest::Client,
}

impl HttpAgentClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("kubegate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                GatewayError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl AgentTransport for HttpAgentClient {
    async fn get(&self, request: AgentRequest) -> std::result::Result<Value, UpstreamError> {
        debug!("GET {} (timeout {:?})", request.url, request.timeout);

        let response = self
            .client
            .get(request.url.clone())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| classify(&request, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: request.url.to_string(),
                status: status.to_string(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                classify(&request, e)
            } else {
                UpstreamError::Decode {
                    url: request.url.to_string(),
                    message: error_chain(&e),
                }
            }
        })
    }
}

fn classify(request: &AgentRequest, err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout {
            url: request.url.to_string(),
            timeout: request.timeout,
        }
    } else {
        UpstreamError::Transport {
            url: request.url.to_string(),
            message: error_chain(&err),
        }
    }
}

/// reqwest's Display hides the root cause (refused, DNS, ...), so walk the
/// source chain.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
