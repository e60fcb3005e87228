use super::user::TokenValidator;
use crate::errors::AppError;
use axum::{
    extract::{OriginalUri, Request, State},
    http::{HeaderMap, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Routes reachable without a bearer token, matched on method and exact path.
#[derive(Debug, Clone, Default)]
pub struct PublicRoutes {
    routes: Vec<(Method, String)>,
}

impl PublicRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, method: Method, path: impl Into<String>) -> Self {
        self.routes.push((method, path.into()));
        self
    }

    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        let path = normalize(path);
        self.routes
            .iter()
            .any(|(m, p)| m == method && normalize(p) == path)
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// State of [`jwt_auth_middleware`].
#[derive(Clone)]
pub struct AuthGate {
    validator: Arc<dyn TokenValidator>,
    public: Arc<PublicRoutes>,
}

impl AuthGate {
    pub fn new(validator: Arc<dyn TokenValidator>, public: PublicRoutes) -> Self {
        Self {
            validator,
            public: Arc::new(public),
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication gate.
///
/// Preflight requests and allow-listed routes pass untouched. Everything else needs a
/// bearer token accepted by the [`TokenValidator`]; the resolved
/// [`AuthUser`](super::AuthUser) is stored in the request extensions.
pub async fn jwt_auth_middleware(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    if request.method() == Method::OPTIONS || gate.public.is_public(request.method(), &path) {
        return next.run(request).await;
    }

    let Some(token) = extract_bearer_token(request.headers()) else {
        tracing::debug!(%path, "Missing bearer token");
        return AppError::Unauthorized("Authentication required".to_string()).into_response();
    };

    let resolved = gate.validator.validate_token(token).await;
    match resolved {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(%path, "Token rejected: {}", e);
            e.into_response()
        }
    }
}
