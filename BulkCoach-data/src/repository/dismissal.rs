use async_trait::async_trait;
use chrono::Utc;

use crate::models::dismissal::CoachDismissal;
use super::backend::StorageBackend;
use super::errors::RepositoryError;
use super::storage::DatabaseStorage;

/// Repository trait for the per-user coaching dismissal record
#[async_trait]
pub trait DismissalRepositoryTrait: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<CoachDismissal>, RepositoryError>;

    /// Replace the record of a user with a new anchor
    async fn put(&self, user_id: &str, w_curr: f64, w_prev: f64, applied: bool) -> Result<CoachDismissal, RepositoryError>;
}

#[derive(Debug, Clone)]
pub struct DismissalRepository {
    backend: StorageBackend,
}

impl DismissalRepository {
    pub fn new(backend: StorageBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl DismissalRepositoryTrait for DismissalRepository {
    async fn get(&self, user_id: &str) -> Result<Option<CoachDismissal>, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::get_dismissal(pool, user_id).await,
            StorageBackend::InMemory(storage) => storage.get_dismissal(user_id).await,
        }
    }

    async fn put(&self, user_id: &str, w_curr: f64, w_prev: f64, applied: bool) -> Result<CoachDismissal, RepositoryError> {
        let dismissal = CoachDismissal {
            user_id: user_id.to_string(),
            w_curr,
            w_prev,
            applied,
            recorded_at: Utc::now(),
        };

        match &self.backend {
            StorageBackend::Database(pool) => {
                DatabaseStorage::put_dismissal(pool, &dismissal).await?;
                Ok(dismissal)
            }
            StorageBackend::InMemory(storage) => storage.put_dismissal(dismissal).await,
        }
    }
}
