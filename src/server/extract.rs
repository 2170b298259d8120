use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::{Form, Json};
use kubegate_common::LoginRequest;

use super::AppState;
use crate::GatewayError;

/// Username of a caller holding a valid bearer token.
///
/// Put it before any other extractor so unauthenticated requests are refused
/// before their parameters are even looked at.
#[derive(Debug, Clone)]
pub struct Caller(pub String);

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| GatewayError::Unauthorized("Not authenticated".to_string()))?;

        let subject = state.auth.verify(token)?;
        Ok(Caller(subject))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Login body read as JSON when the content type says so, as an urlencoded
/// form otherwise
#[derive(Debug)]
pub struct LoginForm(pub LoginRequest);

impl<S> FromRequest<S> for LoginForm
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let body = if is_json {
            Json::<LoginRequest>::from_request(req, state)
                .await
                .map(|Json(body)| body)
                .map_err(|e| GatewayError::BadRequest(e.body_text()))?
        } else {
            Form::<LoginRequest>::from_request(req, state)
                .await
                .map(|Form(body)| body)
                .map_err(|e| GatewayError::BadRequest(e.body_text()))?
        };

        Ok(LoginForm(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer  abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic YWxpY2U6cDE=")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
