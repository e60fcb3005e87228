//! Bearer-token authentication.
//!
//! - [`JwtAuth`] issues and verifies HS256 tokens.
//! - [`jwt_auth_middleware`] guards a router. Requests on the [`PublicRoutes`] allow-list
//!   pass through, every other request needs `Authorization: Bearer <token>`.
//! - The token is resolved to an [`AuthUser`] by a [`TokenValidator`] (implemented by the
//!   users domain) and stored in the request extensions, where handlers pick it up as an
//!   extractor.
//!
//! ```ignore
//! let gate = AuthGate::new(
//!     Arc::new(auth_service.clone()),
//!     PublicRoutes::new()
//!         .allow(Method::POST, "/auth/register")
//!         .allow(Method::POST, "/auth/login"),
//! );
//!
//! let api = Router::new()
//!     .nest("/auth", auth_router)
//!     .nest("/todos", todos_router)
//!     .route_layer(axum::middleware::from_fn_with_state(gate, jwt_auth_middleware));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod user;

pub use config::JwtConfig;
pub use jwt::{JwtAuth, JwtClaims};
pub use middleware::{AuthGate, PublicRoutes, extract_bearer_token, jwt_auth_middleware};
pub use user::{AuthUser, TokenValidator};
