use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::analysis::result::AnalysisResult;
use crate::auth::user::User;
use crate::uploads::record::UploadRecord;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("username is already taken")]
    DuplicateUser,
    #[error("upload not found")]
    UploadNotFound,
    #[error("analysis is already attached")]
    AnalysisAlreadySet,
}

/// Persistence boundary for users and upload records. Handlers and the
/// reminder job only talk to this trait, so the backing store can be swapped
/// without touching business logic.
#[async_trait]
pub trait Store: Send + Sync {
    /// Appends a new user; fails if the username is taken.
    async fn append_user(&self, user: User) -> Result<(), StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Option<User>;
    async fn find_user_by_id(&self, id: Uuid) -> Option<User>;
    async fn list_users(&self) -> Vec<User>;

    async fn append_upload(&self, record: UploadRecord);
    /// All uploads for one user, newest first.
    async fn find_uploads_by_user(&self, user_id: Uuid) -> Vec<UploadRecord>;
    async fn find_upload_by_filename(
        &self,
        user_id: Uuid,
        filename: &str,
    ) -> Option<UploadRecord>;
    /// One-shot transition of `analysis` from `None` to `Some`.
    async fn attach_analysis(
        &self,
        filename: &str,
        analysis: AnalysisResult,
    ) -> Result<(), StoreError>;
}

/// Process-wide in-memory store. Appends only; the collections are shared
/// across request tasks behind async locks.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    uploads: RwLock<Vec<UploadRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn append_user(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateUser);
        }
        users.push(user);
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Option<User> {
        self.users.read().await.iter().find(|u| u.id == id).cloned()
    }

    async fn list_users(&self) -> Vec<User> {
        self.users.read().await.clone()
    }

    async fn append_upload(&self, record: UploadRecord) {
        self.uploads.write().await.push(record);
    }

    async fn find_uploads_by_user(&self, user_id: Uuid) -> Vec<UploadRecord> {
        let mut records: Vec<UploadRecord> = self
            .uploads
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        records
    }

    async fn find_upload_by_filename(
        &self,
        user_id: Uuid,
        filename: &str,
    ) -> Option<UploadRecord> {
        self.uploads
            .read()
            .await
            .iter()
            .find(|r| r.user_id == user_id && r.filename == filename)
            .cloned()
    }

    async fn attach_analysis(
        &self,
        filename: &str,
        analysis: AnalysisResult,
    ) -> Result<(), StoreError> {
        let mut uploads = self.uploads.write().await;
        let record = uploads
            .iter_mut()
            .find(|r| r.filename == filename)
            .ok_or(StoreError::UploadNotFound)?;
        if record.analysis.is_some() {
            return Err(StoreError::AnalysisAlreadySet);
        }
        record.analysis = Some(analysis);
        Ok(())
    }
}
