//! In-process store. One lock guards both tables, so every operation is atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ResumeRepository, UserRepository};
use crate::errors::AppError;
use crate::models::resume::Resume;
use crate::models::user::{NewUser, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    /// Insertion order is creation order.
    resumes: Vec<Resume>,
}

impl Tables {
    fn name_taken(&self, owner_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
        self.resumes
            .iter()
            .any(|r| r.owner_id == owner_id && r.name == name && Some(r.id) != except)
    }

    fn push_resume(&mut self, owner_id: Uuid, name: &str, now: DateTime<Utc>) -> Resume {
        let resume = Resume::new(Uuid::new_v4(), owner_id, name, now);
        self.resumes.push(resume.clone());
        resume
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::DuplicateUsername);
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            bio: user.bio,
            avatar_url: None,
            joined_at: user.joined_at,
            updated_at: user.joined_at,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(AppError::EmailTaken);
        }
        let slot = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;
        // username and joined_at are immutable
        slot.email = user.email.clone();
        slot.password_hash = user.password_hash.clone();
        slot.full_name = user.full_name.clone();
        slot.bio = user.bio.clone();
        slot.avatar_url = user.avatar_url.clone();
        slot.updated_at = user.updated_at;
        Ok(slot.clone())
    }
}

#[async_trait]
impl ResumeRepository for MemoryStore {
    async fn insert_resume(
        &self,
        owner_id: Uuid,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Resume, AppError> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(owner_id, name, None) {
            return Err(AppError::DuplicateName(name.to_string()));
        }
        Ok(tables.push_resume(owner_id, name, now))
    }

    async fn find_resume(&self, id: Uuid) -> Result<Option<Resume>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.resumes.iter().find(|r| r.id == id).cloned())
    }

    async fn find_resume_by_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<Resume>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .resumes
            .iter()
            .find(|r| r.owner_id == owner_id && r.name == name)
            .cloned())
    }

    async fn list_resumes_by_owner(&self, owner_id: Uuid) -> Result<Vec<Resume>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .resumes
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_public_resumes(&self) -> Result<Vec<Resume>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.resumes.iter().filter(|r| r.is_public).cloned().collect())
    }

    async fn first_or_insert_resume(
        &self,
        owner_id: Uuid,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Resume, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(first) = tables.resumes.iter().find(|r| r.owner_id == owner_id) {
            return Ok(first.clone());
        }
        Ok(tables.push_resume(owner_id, name, now))
    }

    async fn update_resume(&self, resume: &Resume) -> Result<Resume, AppError> {
        let mut tables = self.tables.write().await;
        let owner_id = tables
            .resumes
            .iter()
            .find(|r| r.id == resume.id)
            .map(|r| r.owner_id)
            .ok_or_else(|| AppError::NotFound(format!("Resume {} not found", resume.id)))?;
        if tables.name_taken(owner_id, &resume.name, Some(resume.id)) {
            return Err(AppError::DuplicateName(resume.name.clone()));
        }
        let slot = tables
            .resumes
            .iter_mut()
            .find(|r| r.id == resume.id)
            .ok_or_else(|| AppError::NotFound(format!("Resume {} not found", resume.id)))?;
        // owner_id and created_at are immutable
        *slot = Resume {
            id: slot.id,
            owner_id: slot.owner_id,
            created_at: slot.created_at,
            ..resume.clone()
        };
        Ok(slot.clone())
    }

    async fn delete_resume(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.resumes.len();
        tables.resumes.retain(|r| r.id != id);
        Ok(tables.resumes.len() != before)
    }
}
