//! Axum route handlers for registration, login and the caller's own profile.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::extract::AuthUser;
use crate::errors::AppError;
use crate::json::ApiJson;
use crate::models::user::{ProfilePatch, User};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

#[derive(Serialize)]
pub struct TokenStatusResponse {
    pub valid: bool,
    pub username: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if req.username.trim().is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }
    if !req.email.contains('@') {
        return Err(AppError::Validation("invalid email address".to_string()));
    }
    if req.password.is_empty() {
        return Err(AppError::Validation("password cannot be empty".to_string()));
    }

    let user = state
        .credentials
        .register(
            &req.username,
            &req.email,
            &req.password,
            req.full_name.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .credentials
        .authenticate(&req.username, &req.password)
        .await?;
    let issued = state.tokens.issue(&user.username)?;

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: issued.token_type,
        expires_in: issued.expires_in,
        user,
    }))
}

/// GET /api/auth/check-username?username=
pub async fn handle_check_username(
    State(state): State<AppState>,
    Query(q): Query<UsernameQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let available = state.credentials.is_username_available(&q.username).await?;
    Ok(Json(AvailabilityResponse { available }))
}

/// GET /api/auth/check-email?email=
pub async fn handle_check_email(
    State(state): State<AppState>,
    Query(q): Query<EmailQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let available = state.credentials.is_email_available(&q.email).await?;
    Ok(Json(AvailabilityResponse { available }))
}

/// GET /api/auth/validate-token
///
/// The extractor already rejected anything invalid.
pub async fn handle_validate_token(AuthUser(user): AuthUser) -> Json<TokenStatusResponse> {
    Json(TokenStatusResponse {
        valid: true,
        username: user.username,
    })
}

/// GET /api/users/current
pub async fn handle_current_user(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

/// PUT /api/users/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> Result<Json<User>, AppError> {
    let updated = state.credentials.update_profile(user.id, patch).await?;
    Ok(Json(updated))
}

/// PUT /api/users/password
pub async fn handle_change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<PasswordChangeRequest>,
) -> Result<StatusCode, AppError> {
    if req.new_password.is_empty() {
        return Err(AppError::Validation("new password cannot be empty".to_string()));
    }
    state
        .credentials
        .change_password(user.id, &req.current_password, &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

