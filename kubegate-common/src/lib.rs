//! Wire types shared by the aggregator, the per-cluster agent and the CLI
//!
//! Everything here is plain serde data. The aggregator and the agent speak
//! JSON over HTTP, and the CLI consumes what the aggregator returns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pod template annotation bumped to force a rolling restart
pub const RESTART_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Token type advertised in login responses
pub const TOKEN_TYPE_BEARER: &str = "bearer";

/// Login body, accepted either as JSON or as an urlencoded form
///
/// Both fields are optional on the wire so that a missing field can be
/// reported as a bad request instead of a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Returns `(username, password)` when both are present and non-empty
    pub fn into_parts(self) -> Option<(String, String)> {
        match (self.username, self.password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

/// Successful login response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
        }
    }
}

/// Envelope returned by restart operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartResponse {
    pub status: String,
    pub message: String,
}

impl RestartResponse {
    pub fn success(namespace: &str, deployment: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: format!(
                "Deployment {} restarted in namespace {}",
                deployment, namespace
            ),
        }
    }
}

/// Plain acknowledgement, `{"status": "ok"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub status: String,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Free-form event field of a [`LogEvent`]: either a JSON object or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    Object(Map<String, Value>),
    Text(String),
}

impl From<&str> for EventPayload {
    fn from(s: &str) -> Self {
        EventPayload::Text(s.to_string())
    }
}

/// Structured audit event posted by clients to `/log`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Client-side timestamp, kept as sent
    pub ts: String,
    pub level: String,
    pub user: String,
    #[serde(default)]
    pub event: Option<EventPayload>,
    #[serde(default)]
    pub details: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_request_requires_both_fields() {
        assert!(LoginRequest::new("alice", "p1").into_parts().is_some());
        assert!(LoginRequest::new("alice", "").into_parts().is_none());

        let partial: LoginRequest = serde_json::from_value(json!({"username": "alice"})).unwrap();
        assert!(partial.into_parts().is_none());
    }

    #[test]
    fn test_token_response_is_bearer() {
        let body = serde_json::to_value(TokenResponse::bearer("abc")).unwrap();
        assert_eq!(body, json!({"access_token": "abc", "token_type": "bearer"}));
    }

    #[test]
    fn test_event_payload_accepts_object_or_string() {
        let event: LogEvent = serde_json::from_value(json!({
            "ts": "2024-01-01T00:00:00Z",
            "level": "info",
            "user": "alice",
            "event": "login.success",
            "details": {"username": "alice"}
        }))
        .unwrap();
        assert_eq!(event.event, Some(EventPayload::from("login.success")));

        let event: LogEvent = serde_json::from_value(json!({
            "ts": "2024-01-01T00:00:00Z",
            "level": "error",
            "user": "alice",
            "event": {"kind": "restart.failed"}
        }))
        .unwrap();
        assert!(matches!(event.event, Some(EventPayload::Object(_))));
        assert!(event.details.is_none());
    }

    #[test]
    fn test_event_payload_rejects_other_shapes() {
        let result = serde_json::from_value::<LogEvent>(json!({
            "ts": "2024-01-01T00:00:00Z",
            "level": "info",
            "user": "alice",
            "event": 42
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_restart_success_message() {
        let resp = RestartResponse::success("default", "web");
        assert_eq!(resp.status, "success");
        assert_eq!(resp.message, "Deployment web restarted in namespace default");
    }
}
