use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use kubegate_cli::{ClientError, GatewayClient};
use kubegate_common::{Ack, ErrorBody, LogEvent, RestartResponse, TokenResponse};
use serde_json::Map;
use std::collections::HashMap;

const TOKEN: &str = "test-token";

#[derive(Default)]
struct Seen {
    events: Mutex<Vec<LogEvent>>,
}

type Shared = Arc<Seen>;

fn authorized(headers: &HeaderMap) -> Result<(), (StatusCode, Json<ErrorBody>)> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("Not authenticated")),
        )),
    }
}

async fn spawn_aggregator() -> (SocketAddr, Shared) {
    let seen = Shared::default();

    let app = Router::new()
        .route(
            "/login",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                if form.get("username").map(String::as_str) == Some("alice")
                    && form.get("password").map(String::as_str) == Some("wonderland")
                {
                    Ok(Json(TokenResponse::bearer(TOKEN.to_string())))
                } else {
                    Err((
                        StatusCode::UNAUTHORIZED,
                        Json(ErrorBody::new("Incorrect username or password")),
                    ))
                }
            }),
        )
        .route(
            "/clusters",
            get(|headers: HeaderMap| async move {
                authorized(&headers)?;
                Ok::<_, (StatusCode, Json<ErrorBody>)>(Json(vec!["dev", "prod"]))
            }),
        )
        .route(
            "/deployments/{cluster}/{namespace}",
            get(
                |headers: HeaderMap, Path((cluster, namespace)): Path<(String, String)>| async move {
                    authorized(&headers)?;
                    if cluster != "prod" {
                        return Err((
                            StatusCode::NOT_FOUND,
                            Json(ErrorBody::new(format!("Cluster not found: {}", cluster))),
                        ));
                    }
                    Ok(Json(vec![format!("{}-web", namespace)]))
                },
            ),
        )
        .route(
            "/restart",
            get(
                |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                    authorized(&headers)?;
                    Ok::<_, (StatusCode, Json<ErrorBody>)>(Json(RestartResponse::success(
                        &q["namespace"],
                        &q["deployment_name"],
                    )))
                },
            ),
        )
        .route(
            "/log",
            post(
                |State(seen): State<Shared>, headers: HeaderMap, Json(event): Json<LogEvent>| async move {
                    authorized(&headers)?;
                    seen.events.lock().unwrap().push(event);
                    Ok::<_, (StatusCode, Json<ErrorBody>)>(Json(Ack::ok()))
                },
            ),
        )
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, seen)
}

fn client(addr: SocketAddr, token: Option<&str>) -> GatewayClient {
    GatewayClient::new(
        &format!("http://{}", addr),
        token.map(str::to_string),
        "alice",
    )
    .unwrap()
}

#[tokio::test]
async fn test_login_stores_token() {
    let (addr, _) = spawn_aggregator().await;
    let mut client = client(addr, None);

    let token = client.login("alice", "wonderland").await.unwrap();

    assert_eq!(token.access_token, TOKEN);
    assert_eq!(token.token_type, "bearer");
    assert_eq!(client.token(), Some(TOKEN));
    assert_eq!(client.clusters().await.unwrap(), vec!["dev", "prod"]);
}

#[tokio::test]
async fn test_login_failure_surfaces_detail() {
    let (addr, _) = spawn_aggregator().await;
    let mut client = client(addr, None);

    match client.login("alice", "wrong").await {
        Err(ClientError::Api { status, detail }) => {
            assert_eq!(status, 401);
            assert_eq!(detail, "Incorrect username or password");
        }
        other => panic!("unexpected result: {:?}", other.map(|t| t.access_token)),
    }
    assert!(client.token().is_none());
}

#[tokio::test]
async fn test_stale_token_is_rejected() {
    let (addr, _) = spawn_aggregator().await;
    let client = client(addr, Some("stale"));

    let err = client.clusters().await.unwrap_err();
    assert_eq!(err.to_string(), "401: Not authenticated");
}

#[tokio::test]
async fn test_unknown_cluster_detail() {
    let (addr, _) = spawn_aggregator().await;
    let client = client(addr, Some(TOKEN));

    assert_eq!(
        client.deployments("prod", "payments").await.unwrap(),
        vec!["payments-web"]
    );

    let err = client.deployments("qa", "payments").await.unwrap_err();
    assert_eq!(err.to_string(), "404: Cluster not found: qa");
}

#[tokio::test]
async fn test_restart_sends_query() {
    let (addr, _) = spawn_aggregator().await;
    let client = client(addr, Some(TOKEN));

    let response = client.restart("prod", "default", "web").await.unwrap();

    assert_eq!(response.status, "success");
    assert_eq!(response.message, "Deployment web restarted in namespace default");
}

#[tokio::test]
async fn test_log_event_forwarded() {
    let (addr, seen) = spawn_aggregator().await;
    let client = client(addr, Some(TOKEN));

    let mut details = Map::new();
    details.insert("cluster".to_string(), "prod".into());
    client.log_event("info", "clusters.load", details).await;

    let events = seen.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user, "alice");
    assert_eq!(events[0].level, "info");
    assert_eq!(
        events[0].details.as_ref().unwrap()["cluster"],
        serde_json::json!("prod")
    );
}

#[tokio::test]
async fn test_log_event_without_token_is_skipped() {
    let (addr, seen) = spawn_aggregator().await;
    let client = client(addr, None);

    client.log_event("info", "clusters.load", Map::new()).await;

    assert!(seen.events.lock().unwrap().is_empty());
}
