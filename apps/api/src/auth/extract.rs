use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::token::TokenService;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// The caller identified by a valid `Authorization: Bearer` token.
///
/// A token whose subject no longer exists is rejected as `InvalidCredentials`.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?
            .to_str()
            .map_err(|_| AppError::Malformed)?;

        let token = TokenService::bearer(header)?;
        let username = state.tokens.validate(token)?;

        match state.credentials.get_by_username(&username).await {
            Ok(user) => Ok(AuthUser(user)),
            Err(AppError::NotFound(_)) => Err(AppError::InvalidCredentials),
            Err(e) => Err(e),
        }
    }
}
