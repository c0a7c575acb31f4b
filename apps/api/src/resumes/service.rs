//! Document store for owner-scoped resumes and the derived primary resume.
//!
//! The `*_as` methods run the access guard before returning or mutating a resume on
//! behalf of a requester; the unguarded methods are for owner-scoped calls where the
//! owner id already comes from an authenticated identity.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::auth::guard::{authorize_read, authorize_write};
use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::resume::{Resume, ResumePatch};
use crate::store::ResumeRepository;

/// Name given to a primary resume created implicitly.
pub const PRIMARY_RESUME_NAME: &str = "Primary Resume";

pub struct ResumeService {
    resumes: Arc<dyn ResumeRepository>,
    clock: Arc<dyn Clock>,
}

impl ResumeService {
    pub fn new(resumes: Arc<dyn ResumeRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { resumes, clock }
    }

    /// Creates an empty private resume. Fails with `DuplicateName` if the owner already uses `name`.
    pub async fn create(&self, owner_id: Uuid, name: &str) -> Result<Resume, AppError> {
        validate_name(name)?;
        let resume = self
            .resumes
            .insert_resume(owner_id, name, self.clock.now())
            .await?;
        info!("Created resume {} '{}' for owner {owner_id}", resume.id, resume.name);
        Ok(resume)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Resume, AppError> {
        self.resumes
            .find_resume(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn get_by_owner_and_name(&self, owner_id: Uuid, name: &str) -> Result<Resume, AppError> {
        self.resumes
            .find_resume_by_name(owner_id, name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resume '{name}' not found")))
    }

    /// All of the owner's resumes in creation order.
    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Resume>, AppError> {
        self.resumes.list_resumes_by_owner(owner_id).await
    }

    pub async fn list_public(&self) -> Result<Vec<Resume>, AppError> {
        self.resumes.list_public_resumes().await
    }

    /// The owner's earliest-created resume.
    pub async fn get_primary(&self, owner_id: Uuid) -> Result<Resume, AppError> {
        self.list_by_owner(owner_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("No resume found".to_string()))
    }

    /// Merges `patch` into the primary resume, creating it first if the owner has none.
    pub async fn create_or_update_primary(
        &self,
        owner_id: Uuid,
        patch: ResumePatch,
    ) -> Result<Resume, AppError> {
        // The store serializes this per owner, so racing callers share one primary.
        let primary = self
            .resumes
            .first_or_insert_resume(owner_id, PRIMARY_RESUME_NAME, self.clock.now())
            .await?;
        self.merge(primary, patch).await
    }

    pub async fn update(&self, id: Uuid, patch: ResumePatch) -> Result<Resume, AppError> {
        let resume = self.get_by_id(id).await?;
        self.merge(resume, patch).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.resumes.delete_resume(id).await? {
            return Err(not_found(id));
        }
        info!("Deleted resume {id}");
        Ok(())
    }

    // ── Guarded access ──────────────────────────────────────────

    /// Fetches a resume the requester owns or that is public.
    pub async fn get_as(&self, requester_id: Uuid, id: Uuid) -> Result<Resume, AppError> {
        let resume = self.get_by_id(id).await?;
        authorize_read(requester_id, &resume).require()?;
        Ok(resume)
    }

    /// Merges `patch` into a resume the requester owns.
    pub async fn update_as(
        &self,
        requester_id: Uuid,
        id: Uuid,
        patch: ResumePatch,
    ) -> Result<Resume, AppError> {
        let resume = self.get_by_id(id).await?;
        authorize_write(requester_id, &resume).require()?;
        self.merge(resume, patch).await
    }

    /// Deletes a resume the requester owns.
    pub async fn delete_as(&self, requester_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let resume = self.get_by_id(id).await?;
        authorize_write(requester_id, &resume).require()?;
        self.delete(id).await
    }

    async fn merge(&self, mut resume: Resume, patch: ResumePatch) -> Result<Resume, AppError> {
        if let Some(name) = patch.name.as_deref() {
            validate_name(name)?;
        }
        resume.apply(patch);
        resume.updated_at = self.clock.now();
        self.resumes.update_resume(&resume).await
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("resume name cannot be empty".to_string()));
    }
    Ok(())
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Resume {id} not found"))
}
