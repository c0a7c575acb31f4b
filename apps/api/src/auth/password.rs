//! Password hashing utilities.
//!
//! bcrypt is deliberately slow, so both directions run on the blocking pool.

use anyhow::anyhow;

use crate::errors::AppError;

/// Hash a password using bcrypt at the given cost.
pub async fn hash_password(raw: &str, cost: u32) -> Result<String, AppError> {
    let raw = raw.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(raw, cost))
        .await
        .map_err(|e| anyhow!("password hashing task failed: {e}"))?
        .map_err(|e| AppError::Internal(anyhow!("password hashing failed: {e}")))
}

/// Verify a password against a stored bcrypt hash.
pub async fn verify_password(raw: &str, hash: &str) -> Result<bool, AppError> {
    let raw = raw.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(raw, &hash))
        .await
        .map_err(|e| anyhow!("password verification task failed: {e}"))?
        .map_err(|e| AppError::Internal(anyhow!("stored password hash is unusable: {e}")))
}
