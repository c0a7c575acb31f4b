//! PostgreSQL adapter. Sections are JSONB; `seq` (BIGSERIAL) carries creation order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::{ResumeRepository, UserRepository};
use crate::errors::AppError;
use crate::models::resume::{Resume, Section};
use crate::models::user::{NewUser, User};

const USERNAME_CONSTRAINT: &str = "users_username_unique";
const EMAIL_CONSTRAINT: &str = "users_email_unique";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ResumeRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    about_me: String,
    is_public: bool,
    skills: Json<Section>,
    experience: Json<Section>,
    projects: Json<Section>,
    education: Json<Section>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ResumeRow> for Resume {
    fn from(row: ResumeRow) -> Self {
        Resume {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            about_me: row.about_me,
            is_public: row.is_public,
            skills: row.skills.0,
            experience: row.experience.0,
            projects: row.projects.0,
            education: row.education.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Translates unique and foreign-key violations; everything else is a storage fault.
fn classify(e: sqlx::Error, on_unique: impl FnOnce(Option<&str>) -> AppError) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return on_unique(db.constraint());
        }
        if db.is_foreign_key_violation() {
            return AppError::NotFound("Owner not found".to_string());
        }
    }
    AppError::from(e)
}

fn insert_user_conflict(constraint: Option<&str>) -> AppError {
    match constraint {
        Some(EMAIL_CONSTRAINT) => AppError::DuplicateEmail,
        _ => AppError::DuplicateUsername,
    }
}

fn update_user_conflict(constraint: Option<&str>) -> AppError {
    match constraint {
        Some(USERNAME_CONSTRAINT) => AppError::DuplicateUsername,
        _ => AppError::EmailTaken,
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (id, username, email, password_hash, full_name, bio, avatar_url, joined_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NULL, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.bio)
        .bind(user.joined_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            classify(e, insert_user_conflict)
        })
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_user(&self, user: &User) -> Result<User, AppError> {
        // username and joined_at are never written after insert
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, full_name = $4, bio = $5,
                avatar_url = $6, updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.bio)
        .bind(&user.avatar_url)
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            classify(e, update_user_conflict)
        })?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))
    }
}

#[async_trait]
impl ResumeRepository for PgStore {
    async fn insert_resume(
        &self,
        owner_id: Uuid,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Resume, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (id, owner_id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(name)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, |_| AppError::DuplicateName(name.to_string())))?;
        Ok(row.into())
    }

    async fn find_resume(&self, id: Uuid) -> Result<Option<Resume>, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Resume::from))
    }

    async fn find_resume_by_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<Resume>, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE owner_id = $1 AND name = $2",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Resume::from))
    }

    async fn list_resumes_by_owner(&self, owner_id: Uuid) -> Result<Vec<Resume>, AppError> {
        let rows = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE owner_id = $1 ORDER BY seq ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Resume::from).collect())
    }

    async fn list_public_resumes(&self) -> Result<Vec<Resume>, AppError> {
        let rows = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE is_public ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Resume::from).collect())
    }

    async fn first_or_insert_resume(
        &self,
        owner_id: Uuid,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Resume, AppError> {
        let mut tx = self.pool.begin().await?;

        // Per-owner lock, released at commit/rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(owner_id.to_string())
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE owner_id = $1 ORDER BY seq ASC LIMIT 1",
        )
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match existing {
            Some(row) => row,
            None => {
                debug!("No resume for owner {owner_id}; inserting '{name}'");
                sqlx::query_as::<_, ResumeRow>(
                    r#"
                    INSERT INTO resumes (id, owner_id, name, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $4)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(owner_id)
                .bind(name)
                .bind(now)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| classify(e, |_| AppError::DuplicateName(name.to_string())))?
            }
        };

        tx.commit().await?;
        Ok(row.into())
    }

    async fn update_resume(&self, resume: &Resume) -> Result<Resume, AppError> {
        // owner_id and created_at are never written after insert
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            UPDATE resumes
            SET name = $2, about_me = $3, is_public = $4,
                skills = $5, experience = $6, projects = $7, education = $8,
                updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(resume.id)
        .bind(&resume.name)
        .bind(&resume.about_me)
        .bind(resume.is_public)
        .bind(Json(&resume.skills))
        .bind(Json(&resume.experience))
        .bind(Json(&resume.projects))
        .bind(Json(&resume.education))
        .bind(resume.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, |_| AppError::DuplicateName(resume.name.clone())))?
        .ok_or_else(|| AppError::NotFound(format!("Resume {} not found", resume.id)))?;
        Ok(row.into())
    }

    async fn delete_resume(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::sync::Arc;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum Violation {
        Unique,
        ForeignKey,
        Other,
    }

    #[derive(Debug)]
    struct FakeDbError {
        violation: Violation,
        constraint: Option<&'static str>,
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake database error")
        }
    }

    impl std::error::Error for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "fake database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> ErrorKind {
            match self.violation {
                Violation::Unique => ErrorKind::UniqueViolation,
                Violation::ForeignKey => ErrorKind::ForeignKeyViolation,
                Violation::Other => ErrorKind::Other,
            }
        }
    }

    fn db_error(violation: Violation, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError {
            violation,
            constraint,
        }))
    }

    #[test]
    fn test_insert_user_conflict_uses_constraint_name() {
        let e = classify(
            db_error(Violation::Unique, Some(EMAIL_CONSTRAINT)),
            insert_user_conflict,
        );
        assert!(matches!(e, AppError::DuplicateEmail));

        let e = classify(
            db_error(Violation::Unique, Some(USERNAME_CONSTRAINT)),
            insert_user_conflict,
        );
        assert!(matches!(e, AppError::DuplicateUsername));
    }

    #[test]
    fn test_update_user_conflict_uses_constraint_name() {
        let e = classify(
            db_error(Violation::Unique, Some(EMAIL_CONSTRAINT)),
            update_user_conflict,
        );
        assert!(matches!(e, AppError::EmailTaken));

        let e = classify(
            db_error(Violation::Unique, Some(USERNAME_CONSTRAINT)),
            update_user_conflict,
        );
        assert!(matches!(e, AppError::DuplicateUsername));
    }

    #[test]
    fn test_foreign_key_violation_is_not_found() {
        let e = classify(
            db_error(Violation::ForeignKey, Some("resumes_owner_id_fkey")),
            |_| AppError::DuplicateName("CV".into()),
        );
        assert!(matches!(e, AppError::NotFound(_)));
    }

    #[test]
    fn test_other_errors_are_storage_unavailable() {
        let e = classify(db_error(Violation::Other, None), insert_user_conflict);
        assert!(matches!(e, AppError::StorageUnavailable(_)));

        let e = classify(sqlx::Error::PoolTimedOut, insert_user_conflict);
        assert!(matches!(e, AppError::StorageUnavailable(_)));
    }

    /// Needs a disposable database: `DATABASE_URL=... cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_concurrent_primary_creation_yields_one_resume() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return;
        };
        let store = Arc::new(PgStore::new(crate::db::create_pool(&url).await.unwrap()));
        let tag = Uuid::new_v4().simple().to_string();
        let owner = store
            .insert_user(NewUser {
                username: format!("u{tag}"),
                email: format!("{tag}@example.com"),
                password_hash: "x".into(),
                full_name: String::new(),
                bio: String::new(),
                joined_at: Utc::now(),
            })
            .await
            .unwrap();
        let owner_id = owner.id;

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .first_or_insert_resume(owner_id, "Primary Resume", Utc::now())
                        .await
                        .unwrap()
                        .id
                })
            })
            .collect();
        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.list_resumes_by_owner(owner_id).await.unwrap().len(), 1);
    }
}
