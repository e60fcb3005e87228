use axum::{Json, Router, http::Method, middleware, routing::get};
use axum_helpers::{AuthGate, JwtAuth, PublicRoutes, jwt_auth_middleware};
use domain_todos::categories::{CategoryRepository, CategoryService, PgCategoryRepository};
use domain_todos::{PgTodoRepository, TodoRepository, TodoService};
use domain_users::{AuthService, PgUserRepository, UserRepository};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::state::AppState;

pub mod health;

/// Routes reachable without a bearer token.
pub fn public_routes() -> PublicRoutes {
    PublicRoutes::new()
        .allow(Method::POST, "/auth/register")
        .allow(Method::POST, "/auth/login")
}

/// Builds the PostgreSQL-backed services and composes the API routes.
pub fn routes(state: &AppState) -> Router {
    let auth = AuthService::new(
        PgUserRepository::new(state.db.clone()),
        JwtAuth::new(&state.config.jwt),
    );
    let todos = TodoService::new(PgTodoRepository::new(state.db.clone()));
    let categories = CategoryService::new(PgCategoryRepository::new(state.db.clone()));

    compose(auth, todos, categories)
}

/// Mounts the domain routers behind the auth gate, plus the public welcome route.
///
/// The gate is a route layer, so unknown paths still fall through to the JSON 404.
pub fn compose<U, T, C>(
    auth: AuthService<U>,
    todos: TodoService<T>,
    categories: CategoryService<C>,
) -> Router
where
    U: UserRepository + Clone + 'static,
    T: TodoRepository + 'static,
    C: CategoryRepository + 'static,
{
    let gate = AuthGate::new(Arc::new(auth.clone()), public_routes());

    let protected = Router::new()
        .nest("/auth", domain_users::handlers::router(auth))
        .nest("/todos", domain_todos::handlers::router(todos))
        .nest(
            "/categories",
            domain_todos::categories::handlers::router(categories),
        )
        .route_layer(middleware::from_fn_with_state(gate, jwt_auth_middleware));

    Router::new().route("/", get(welcome)).merge(protected)
}

async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Todo API",
        "docs": "/swagger-ui",
    }))
}

/// `/ready`, with real database checks.
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum_helpers::JwtConfig;
    use domain_todos::InMemoryTodoRepository;
    use domain_users::InMemoryUserRepository;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        let auth = AuthService::new(
            InMemoryUserRepository::new(),
            JwtAuth::new(&JwtConfig::new("api-routes-test-secret-long-enough!!")),
        );
        let todos = InMemoryTodoRepository::new();
        let categories = CategoryService::new(todos.categories());
        compose(auth, TodoService::new(todos), categories)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_welcome_is_public() {
        let (status, body) = send(&app(), Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Welcome to the Todo API");
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_token() {
        let app = app();
        for uri in ["/todos", "/todos/statistics", "/categories", "/auth/profile"] {
            let (status, body) = send(&app, Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn test_registered_user_reaches_todos() {
        let app = app();
        let (status, _) = send(
            &app,
            post_json(
                "/auth/register",
                json!({"username": "alice", "email": "alice@example.com", "password": "secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            post_json(
                "/auth/login",
                json!({"email": "alice@example.com", "password": "secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["accessToken"].as_str().unwrap().to_string();

        let request = Request::post("/todos")
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from(json!({"title": "Ship it"}).to_string()))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["title"], "Ship it");
        assert_eq!(body["progress"], 0);

        let request = Request::get("/todos")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
