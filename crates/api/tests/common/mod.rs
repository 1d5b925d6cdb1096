#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use versionflow_api::app::build_router;
use versionflow_api::auth::jwt::{generate_access_token, JwtConfig};
use versionflow_api::config::ServerConfig;
use versionflow_api::state::AppState;

/// A `ServerConfig` for tests with a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        cors_origins: vec![HeaderValue::from_static("http://localhost:5173")],
        request_timeout: Duration::from_secs(30),
        jwt: JwtConfig {
            secret: "versionflow-integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// The production router and middleware stack over the test pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_router(AppState {
        pool,
        config: Arc::new(test_config()),
    })
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Issue an access token for a fresh user id with the given role.
pub fn token_for(role: &str) -> (Uuid, String) {
    let user_id = Uuid::new_v4();
    let token = generate_access_token(user_id, role, &test_config().jwt).unwrap();
    (user_id, token)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
}

/// Unauthenticated GET.
pub async fn get(app: Router, uri: &str) -> Response {
    send(app, request(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::GET, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(
        app,
        request(method, uri, Some(token))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::POST, uri, body, token).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::PUT, uri, body, token).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::PATCH, uri, body, token).await
}

/// Authenticated POST with an empty body.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::POST, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::DELETE, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
