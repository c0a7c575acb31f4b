//! Credential store: registration, authentication and profile maintenance.
//!
//! Holds its collaborators explicitly: the user repository, a clock and the bcrypt cost.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::user::{NewUser, ProfilePatch, User};
use crate::store::UserRepository;

/// Unknown usernames are verified against this, hashed once at the configured cost.
const DUMMY_PASSWORD: &str = "forest-api-dummy-password";

pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    bcrypt_cost: u32,
    dummy_hash: OnceCell<String>,
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>, bcrypt_cost: u32) -> Self {
        Self {
            users,
            clock,
            bcrypt_cost,
            dummy_hash: OnceCell::new(),
        }
    }

    // ── Registration ────────────────────────────────────────────

    /// Registers a new user. Username is checked before email, so a request
    /// colliding on both reports `DuplicateUsername`.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        raw_password: &str,
        full_name: Option<&str>,
    ) -> Result<User, AppError> {
        if self.users.find_user_by_username(username).await?.is_some() {
            return Err(AppError::DuplicateUsername);
        }
        if self.users.find_user_by_email(email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = hash_password(raw_password, self.bcrypt_cost).await?;
        let user = self
            .users
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                full_name: full_name.unwrap_or_default().to_string(),
                bio: String::new(),
                joined_at: self.clock.now(),
            })
            .await?;

        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    // ── Authentication ──────────────────────────────────────────

    /// Verifies a username/password pair. Unknown user and wrong password are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, raw_password: &str) -> Result<User, AppError> {
        let Some(user) = self.users.find_user_by_username(username).await? else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| hash_password(DUMMY_PASSWORD, self.bcrypt_cost))
                .await?;
            verify_password(raw_password, dummy).await?;
            debug!("Authentication rejected");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(raw_password, &user.password_hash).await? {
            debug!("Authentication rejected");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Replaces the password after re-verifying the current one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_raw_password: &str,
        new_raw_password: &str,
    ) -> Result<(), AppError> {
        let mut user = self.get_by_id(user_id).await?;

        if !verify_password(current_raw_password, &user.password_hash).await? {
            return Err(AppError::WrongCurrentPassword);
        }

        user.password_hash = hash_password(new_raw_password, self.bcrypt_cost).await?;
        user.updated_at = self.clock.now();
        self.users.update_user(&user).await?;

        info!("Password changed for user {user_id}");
        Ok(())
    }

    // ── Profile ─────────────────────────────────────────────────

    /// Applies the present fields of `patch`. A changed email must not belong to another user.
    pub async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch) -> Result<User, AppError> {
        let mut user = self.get_by_id(user_id).await?;

        if let Some(email) = patch.email.as_deref() {
            if email != user.email {
                if let Some(holder) = self.users.find_user_by_email(email).await? {
                    if holder.id != user_id {
                        return Err(AppError::EmailTaken);
                    }
                }
            }
        }

        user.apply_profile(patch);
        user.updated_at = self.clock.now();
        self.users.update_user(&user).await
    }

    // ── Lookups ─────────────────────────────────────────────────

    pub async fn get_by_id(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User, AppError> {
        self.users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{username}' not found")))
    }

    pub async fn is_username_available(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.users.find_user_by_username(username).await?.is_none())
    }

    pub async fn is_email_available(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.users.find_user_by_email(email).await?.is_none())
    }
}
