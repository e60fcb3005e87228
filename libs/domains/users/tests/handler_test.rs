//! Handler tests for the users domain
//!
//! The auth router is driven through `oneshot()` behind the same auth gate the
//! application uses, backed by the in-memory repository.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum_helpers::{AuthGate, JwtAuth, JwtConfig, PublicRoutes, jwt_auth_middleware};
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "handler-test-secret-that-is-long-enough";

fn app() -> Router {
    let service = AuthService::new(
        InMemoryUserRepository::new(),
        JwtAuth::new(&JwtConfig::new(SECRET)),
    );
    let gate = AuthGate::new(
        Arc::new(service.clone()),
        PublicRoutes::new()
            .allow(Method::POST, "/auth/register")
            .allow(Method::POST, "/auth/login"),
    );

    Router::new()
        .nest("/auth", handlers::router(service))
        .route_layer(axum::middleware::from_fn_with_state(gate, jwt_auth_middleware))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn register_and_login(app: &Router, username: &str) -> String {
    let email = format!("{}@example.com", username);
    let (status, _) = send(
        app,
        post_json(
            "/auth/register",
            json!({"username": username, "email": email, "password": "secret1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        post_json("/auth/login", json!({"email": email, "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_returns_201_without_password() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json(
            "/auth/register",
            json!({"username": "alice", "email": "alice@example.com", "password": "secret1"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["avatar"], "");
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_duplicates_are_409() {
    let app = app();
    let first = json!({"username": "alice", "email": "alice@example.com", "password": "secret1"});
    send(&app, post_json("/auth/register", first)).await;

    let (status, body) = send(
        &app,
        post_json(
            "/auth/register",
            json!({"username": "alice", "email": "other@example.com", "password": "secret1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username already exists");

    let (status, body) = send(
        &app,
        post_json(
            "/auth/register",
            json!({"username": "other", "email": "alice@example.com", "password": "secret1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already exists");
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json(
            "/auth/register",
            json!({"username": "", "email": "nope", "password": "123"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["details"].get("password").is_some());
    assert!(body["details"].get("email").is_some());
}

#[tokio::test]
async fn test_login_failures_have_identical_bodies() {
    let app = app();
    register_and_login(&app, "alice").await;

    let (status_a, body_a) = send(
        &app,
        post_json(
            "/auth/login",
            json!({"email": "alice@example.com", "password": "wrong-password"}),
        ),
    )
    .await;
    let (status_b, body_b) = send(
        &app,
        post_json(
            "/auth/login",
            json!({"email": "nobody@example.com", "password": "secret1"}),
        ),
    )
    .await;

    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_b, StatusCode::UNAUTHORIZED);
    assert_eq!(body_a, body_b);
    assert_eq!(body_a["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_profile_requires_token() {
    let app = app();

    let (status, _) = send(
        &app,
        Request::get("/auth/profile").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Request::get("/auth/profile")
            .header("authorization", "Bearer garbage")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_roundtrip() {
    let app = app();
    let token = register_and_login(&app, "alice").await;

    let (status, body) = send(
        &app,
        Request::get("/auth/profile")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");

    let (status, body) = send(
        &app,
        Request::builder()
            .method("PATCH")
            .uri("/auth/profile")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(json!({"avatar": "https://example.com/a.png"}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["avatar"], "https://example.com/a.png");
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn test_profile_update_conflict() {
    let app = app();
    let token = register_and_login(&app, "alice").await;
    register_and_login(&app, "bob").await;

    let (status, body) = send(
        &app,
        Request::builder()
            .method("PATCH")
            .uri("/auth/profile")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(json!({"email": "bob@example.com"}).to_string()))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already exists");
}
