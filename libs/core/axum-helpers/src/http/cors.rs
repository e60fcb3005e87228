use axum::http::{HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Environment variable holding a comma-separated origin allow-list.
pub const CORS_ALLOWED_ORIGIN_ENV: &str = "CORS_ALLOWED_ORIGIN";

/// CORS layer restricted to the given origins.
///
/// Allows the methods the REST API uses, the `Content-Type`, `Authorization` and
/// `Accept` request headers, and caches preflight responses for an hour.
pub fn create_cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Allows any origin.
pub fn create_permissive_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Parses a comma-separated origin list. Entries that are not valid header values are skipped.
pub fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

/// Builds the CORS layer from `CORS_ALLOWED_ORIGIN`.
///
/// Unset, empty or `*` means every origin is accepted.
pub fn cors_layer_from_env() -> CorsLayer {
    match std::env::var(CORS_ALLOWED_ORIGIN_ENV) {
        Ok(raw) if !raw.trim().is_empty() && raw.trim() != "*" => {
            let origins = parse_origins(&raw);
            if origins.is_empty() {
                tracing::warn!("No valid CORS origins configured, allowing any origin");
                create_permissive_cors_layer()
            } else {
                tracing::info!(count = origins.len(), "CORS restricted to configured origins");
                create_cors_layer(origins)
            }
        }
        _ => create_permissive_cors_layer(),
    }
}
