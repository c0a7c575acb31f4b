//! Axum route handlers for the Resume API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extract::AuthUser;
use crate::errors::AppError;
use crate::json::ApiJson;
use crate::models::resume::{Resume, ResumePatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResumeRequest {
    #[serde(alias = "resumeName")]
    pub name: String,
}

/// GET /api/resumes
pub async fn handle_list_own(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Resume>>, AppError> {
    Ok(Json(state.resumes.list_by_owner(user.id).await?))
}

/// POST /api/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateResumeRequest>,
) -> Result<(StatusCode, Json<Resume>), AppError> {
    let resume = state.resumes.create(user.id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(resume)))
}

/// GET /api/resumes/me
pub async fn handle_get_primary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Resume>, AppError> {
    Ok(Json(state.resumes.get_primary(user.id).await?))
}

/// POST /api/resumes/me
pub async fn handle_upsert_primary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(patch): ApiJson<ResumePatch>,
) -> Result<Json<Resume>, AppError> {
    Ok(Json(
        state.resumes.create_or_update_primary(user.id, patch).await?,
    ))
}

/// GET /api/resumes/named/:name
pub async fn handle_get_by_name(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(name): Path<String>,
) -> Result<Json<Resume>, AppError> {
    Ok(Json(
        state.resumes.get_by_owner_and_name(user.id, &name).await?,
    ))
}

/// GET /api/resumes/public
pub async fn handle_list_public(
    State(state): State<AppState>,
) -> Result<Json<Vec<Resume>>, AppError> {
    Ok(Json(state.resumes.list_public().await?))
}

/// GET /api/resumes/default-template
pub async fn handle_default_template() -> Json<ResumePatch> {
    Json(ResumePatch::default_template())
}

/// GET /api/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Resume>, AppError> {
    Ok(Json(state.resumes.get_as(user.id, id).await?))
}

/// PUT /api/resumes/:id
pub async fn handle_update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<ResumePatch>,
) -> Result<Json<Resume>, AppError> {
    Ok(Json(state.resumes.update_as(user.id, id, patch).await?))
}

/// DELETE /api/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.resumes.delete_as(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
