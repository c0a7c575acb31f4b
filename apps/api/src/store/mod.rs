//! Persistence seam for users and resumes.
//!
//! Services hold `Arc<dyn UserRepository>` / `Arc<dyn ResumeRepository>` and never see
//! the backend. Adapters enforce the uniqueness invariants themselves and translate
//! violations into the typed `AppError` variants; every other backend fault surfaces
//! as `AppError::StorageUnavailable`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::Resume;
use crate::models::user::{NewUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateUsername` or `DuplicateEmail`.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Persists every mutable field. Fails with `NotFound` or `EmailTaken`.
    async fn update_user(&self, user: &User) -> Result<User, AppError>;
}

#[async_trait]
pub trait ResumeRepository: Send + Sync {
    /// Inserts an empty private resume. Fails with `DuplicateName`.
    async fn insert_resume(
        &self,
        owner_id: Uuid,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Resume, AppError>;
    async fn find_resume(&self, id: Uuid) -> Result<Option<Resume>, AppError>;
    async fn find_resume_by_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<Resume>, AppError>;
    /// Creation order.
    async fn list_resumes_by_owner(&self, owner_id: Uuid) -> Result<Vec<Resume>, AppError>;
    /// Creation order.
    async fn list_public_resumes(&self) -> Result<Vec<Resume>, AppError>;
    /// Returns the owner's earliest resume, inserting one named `name` if the owner has none.
    /// Serialized per owner: concurrent callers never create two.
    async fn first_or_insert_resume(
        &self,
        owner_id: Uuid,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Resume, AppError>;
    /// Persists every mutable field. Fails with `NotFound` or `DuplicateName`.
    async fn update_resume(&self, resume: &Resume) -> Result<Resume, AppError>;
    /// Returns `false` if nothing was deleted.
    async fn delete_resume(&self, id: Uuid) -> Result<bool, AppError>;
}
