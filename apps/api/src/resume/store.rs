//! Resume document store: one collection of resumes per user.
//!
//! `AppState` holds an `Arc<dyn ResumeStore>`. PostgreSQL is the production
//! backend; the in-memory backend is used when no `DATABASE_URL` is set and
//! in tests. Both stamp `updated_at` on every write and resolve concurrent
//! writes as last-write-wins.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, StoreOperation};
use crate::models::resume::{Resume, ResumeRow};
use crate::resume::lifecycle::touched;

pub fn document_path(user_id: Uuid, id: Uuid) -> String {
    format!("users/{user_id}/resumes/{id}")
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Resume {id} not found"))
}

fn denied(user_id: Uuid, id: Uuid, operation: StoreOperation, payload: Option<&Resume>) -> AppError {
    AppError::PermissionDenied {
        path: document_path(user_id, id),
        operation,
        payload: payload.and_then(|r| serde_json::to_value(r).ok()),
    }
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// All resumes of a user, most recently updated first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Resume>, AppError>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Resume, AppError>;

    /// Saves `draft` under a newly generated id. Any id on the draft is ignored.
    async fn create(&self, user_id: Uuid, draft: &Resume) -> Result<Resume, AppError>;

    /// Writes `draft` as document `id`, creating it if absent. The last write wins.
    async fn save(&self, user_id: Uuid, id: Uuid, draft: &Resume) -> Result<Resume, AppError>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend
// ────────────────────────────────────────────────────────────────────────────

struct StoredResume {
    owner: Uuid,
    resume: Resume,
}

#[derive(Default)]
pub struct MemoryResumeStore {
    docs: RwLock<HashMap<Uuid, StoredResume>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Resume>, AppError> {
        let docs = self.docs.read().await;
        let mut resumes: Vec<Resume> = docs
            .values()
            .filter(|d| d.owner == user_id)
            .map(|d| d.resume.clone())
            .collect();
        resumes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(resumes)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Resume, AppError> {
        let docs = self.docs.read().await;
        let doc = docs.get(&id).ok_or_else(|| not_found(id))?;
        if doc.owner != user_id {
            return Err(denied(user_id, id, StoreOperation::Get, None));
        }
        Ok(doc.resume.clone())
    }

    async fn create(&self, user_id: Uuid, draft: &Resume) -> Result<Resume, AppError> {
        let id = Uuid::new_v4();
        let mut saved = touched(draft, None);
        saved.id = Some(id);
        self.docs.write().await.insert(
            id,
            StoredResume {
                owner: user_id,
                resume: saved.clone(),
            },
        );
        info!("Created resume {id} for user {user_id}");
        Ok(saved)
    }

    async fn save(&self, user_id: Uuid, id: Uuid, draft: &Resume) -> Result<Resume, AppError> {
        let mut docs = self.docs.write().await;
        let stored = match docs.get(&id) {
            Some(existing) if existing.owner != user_id => {
                return Err(denied(user_id, id, StoreOperation::Update, Some(draft)));
            }
            Some(existing) => Some(existing.resume.updated_at),
            None => None,
        };
        let mut saved = touched(draft, stored);
        saved.id = Some(id);
        docs.insert(
            id,
            StoredResume {
                owner: user_id,
                resume: saved.clone(),
            },
        );
        info!("Saved resume {id} for user {user_id}");
        Ok(saved)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut docs = self.docs.write().await;
        let owner = docs.get(&id).map(|d| d.owner).ok_or_else(|| not_found(id))?;
        if owner != user_id {
            return Err(denied(user_id, id, StoreOperation::Delete, None));
        }
        docs.remove(&id);
        info!("Deleted resume {id} for user {user_id}");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL backend
// ────────────────────────────────────────────────────────────────────────────

pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Owner and last stamp of document `id`, if it exists.
    async fn stored(&self, id: Uuid) -> Result<Option<(Uuid, DateTime<Utc>)>, AppError> {
        Ok(sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            "SELECT user_id, updated_at FROM resumes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Resume>, AppError> {
        let rows = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Resume::from).collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Resume, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))?;
        if row.user_id != user_id {
            return Err(denied(user_id, id, StoreOperation::Get, None));
        }
        Ok(row.into())
    }

    async fn create(&self, user_id: Uuid, draft: &Resume) -> Result<Resume, AppError> {
        let id = Uuid::new_v4();
        let stamped = touched(draft, None);
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (id, user_id, title, content, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&stamped.title)
        .bind(Json(&stamped.content))
        .bind(stamped.updated_at)
        .fetch_one(&self.pool)
        .await?;
        info!("Created resume {id} for user {user_id}");
        Ok(row.into())
    }

    async fn save(&self, user_id: Uuid, id: Uuid, draft: &Resume) -> Result<Resume, AppError> {
        let stored = match self.stored(id).await? {
            Some((owner, _)) if owner != user_id => {
                return Err(denied(user_id, id, StoreOperation::Update, Some(draft)));
            }
            Some((_, updated_at)) => Some(updated_at),
            None => None,
        };
        let stamped = touched(draft, stored);
        // The WHERE clause guards against the row changing hands between the
        // ownership check and the write.
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (id, user_id, title, content, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
                SET title = EXCLUDED.title,
                    content = EXCLUDED.content,
                    updated_at = EXCLUDED.updated_at
                WHERE resumes.user_id = EXCLUDED.user_id
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&stamped.title)
        .bind(Json(&stamped.content))
        .bind(stamped.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| denied(user_id, id, StoreOperation::Update, Some(draft)))?;
        info!("Saved resume {id} for user {user_id}");
        Ok(row.into())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.stored(id).await? {
            None => return Err(not_found(id)),
            Some((owner, _)) if owner != user_id => {
                return Err(denied(user_id, id, StoreOperation::Delete, None))
            }
            Some(_) => {}
        }
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        info!("Deleted resume {id} for user {user_id}");
        Ok(())
    }
}
