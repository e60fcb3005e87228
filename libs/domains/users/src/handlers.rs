use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, AuthUser, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        UnauthorizedResponse,
    },
    extract_ip_from_headers, extract_user_agent,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfile, UserResponse};
use crate::repository::UserRepository;
use crate::service::AuthService;

const TAG: &str = "auth";

/// OpenAPI documentation for the auth endpoints
#[derive(OpenApi)]
#[openapi(
    paths(register, login, get_profile, update_profile),
    components(
        schemas(RegisterRequest, LoginRequest, LoginResponse, UpdateProfile, UserResponse),
        responses(
            BadRequestValidationResponse,
            ConflictResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Registration, login and profile")
    )
)]
pub struct ApiDoc;

/// Create the auth router. Mount it under `/auth`.
pub fn router<R: UserRepository + 'static>(service: AuthService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(get_profile).patch(update_profile))
        .with_state(shared_service)
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/register",
    tag = TAG,
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<R: UserRepository>(
    State(service): State<Arc<AuthService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> UserResult<impl IntoResponse> {
    let user = service.register(input).await?;

    AuditEvent::new(
        Some(user.id),
        "user.register",
        Some(format!("user:{}", user.id)),
        AuditOutcome::Success,
    )
    .with_ip(extract_ip_from_headers(&headers))
    .with_user_agent(extract_user_agent(&headers))
    .with_details(json!({ "username": user.username }))
    .log();

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R: UserRepository>(
    State(service): State<Arc<AuthService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Json<LoginResponse>> {
    let email = input.email.clone();
    let result = service.login(input).await;

    let audited = match &result {
        Ok(response) => Some((Some(response.user.id), AuditOutcome::Success)),
        Err(UserError::InvalidCredentials) => Some((None, AuditOutcome::Failure)),
        Err(_) => None,
    };

    if let Some((user_id, outcome)) = audited {
        AuditEvent::new(user_id, "user.login", None, outcome)
            .with_ip(extract_ip_from_headers(&headers))
            .with_user_agent(extract_user_agent(&headers))
            .with_details(json!({ "email": email }))
            .log();
    }

    result.map(Json)
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/profile",
    tag = TAG,
    responses(
        (status = 200, description = "Profile of the caller", body = UserResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_profile<R: UserRepository>(
    State(service): State<Arc<AuthService<R>>>,
    user: AuthUser,
) -> UserResult<Json<UserResponse>> {
    let profile = service.get_profile(user.id).await?;
    Ok(Json(profile.into()))
}

/// Update the caller's profile
#[utoipa::path(
    patch,
    path = "/profile",
    tag = TAG,
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_profile<R: UserRepository>(
    State(service): State<Arc<AuthService<R>>>,
    headers: HeaderMap,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<UpdateProfile>,
) -> UserResult<Json<UserResponse>> {
    let changed: Vec<&str> = [
        ("username", input.username.is_some()),
        ("email", input.email.is_some()),
        ("password", input.password.is_some()),
        ("avatar", input.avatar.is_some()),
    ]
    .into_iter()
    .filter_map(|(field, present)| present.then_some(field))
    .collect();

    let updated = service.update_profile(user.id, input).await?;

    AuditEvent::new(
        Some(user.id),
        "user.profile_update",
        Some(format!("user:{}", user.id)),
        AuditOutcome::Success,
    )
    .with_ip(extract_ip_from_headers(&headers))
    .with_user_agent(extract_user_agent(&headers))
    .with_details(json!({ "fields": changed }))
    .log();

    Ok(Json(updated.into()))
}
