use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::body_log::{BodyLog, CreateBodyLogRequest};
use super::backend::StorageBackend;
use super::errors::RepositoryError;
use super::storage::DatabaseStorage;

/// Repository trait for daily body logs
#[async_trait]
pub trait BodyLogRepositoryTrait: Send + Sync {
    /// Store a new log, at most one per user and day
    async fn create(&self, request: CreateBodyLogRequest) -> Result<BodyLog, RepositoryError>;

    /// Replace the measurements of the log stored for (user, date)
    async fn update(&self, user_id: &str, date: NaiveDate, request: CreateBodyLogRequest) -> Result<BodyLog, RepositoryError>;

    /// Delete the log for (user, date), returning whether one existed
    async fn delete(&self, user_id: &str, date: NaiveDate) -> Result<bool, RepositoryError>;

    async fn get_by_date(&self, user_id: &str, date: NaiveDate) -> Result<Option<BodyLog>, RepositoryError>;

    /// All logs of a user, newest first
    async fn list(&self, user_id: &str) -> Result<Vec<BodyLog>, RepositoryError>;

    /// Logs dated within `from..=to`, oldest first
    async fn list_between(&self, user_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<BodyLog>, RepositoryError>;

    /// The last `window_days` calendar days ending at `as_of` inclusive, oldest first
    async fn list_recent(&self, user_id: &str, window_days: u32, as_of: NaiveDate) -> Result<Vec<BodyLog>, RepositoryError> {
        if window_days == 0 {
            return Ok(Vec::new());
        }
        let from = as_of - Duration::days(i64::from(window_days) - 1);
        self.list_between(user_id, from, as_of).await
    }
}

/// Repository for body logs backed by SQLite or in-memory tables
#[derive(Debug, Clone)]
pub struct BodyLogRepository {
    backend: StorageBackend,
}

impl BodyLogRepository {
    pub fn new(backend: StorageBackend) -> Self {
        Self { backend }
    }
}

impl Default for BodyLogRepository {
    fn default() -> Self {
        Self::new(StorageBackend::default())
    }
}

#[async_trait]
impl BodyLogRepositoryTrait for BodyLogRepository {
    async fn create(&self, request: CreateBodyLogRequest) -> Result<BodyLog, RepositoryError> {
        let log = BodyLog::from_request(Uuid::new_v4().to_string(), request, Utc::now());

        match &self.backend {
            StorageBackend::Database(pool) => {
                DatabaseStorage::insert_body_log(pool, &log).await?;
                Ok(log)
            }
            StorageBackend::InMemory(storage) => storage.insert_body_log(log).await,
        }
    }

    async fn update(&self, user_id: &str, date: NaiveDate, request: CreateBodyLogRequest) -> Result<BodyLog, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::replace_body_log(pool, user_id, date, request).await,
            StorageBackend::InMemory(storage) => storage.replace_body_log(user_id, date, request).await,
        }
    }

    async fn delete(&self, user_id: &str, date: NaiveDate) -> Result<bool, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::delete_body_log(pool, user_id, date).await,
            StorageBackend::InMemory(storage) => storage.delete_body_log(user_id, date).await,
        }
    }

    async fn get_by_date(&self, user_id: &str, date: NaiveDate) -> Result<Option<BodyLog>, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::get_body_log(pool, user_id, date).await,
            StorageBackend::InMemory(storage) => storage.get_body_log(user_id, date).await,
        }
    }

    async fn list(&self, user_id: &str) -> Result<Vec<BodyLog>, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::list_body_logs(pool, user_id).await,
            StorageBackend::InMemory(storage) => storage.list_body_logs(user_id).await,
        }
    }

    async fn list_between(&self, user_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<BodyLog>, RepositoryError> {
        debug!("Listing body logs for user={} between {} and {}", user_id, from, to);

        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::list_body_logs_between(pool, user_id, from, to).await,
            StorageBackend::InMemory(storage) => storage.list_body_logs_between(user_id, from, to).await,
        }
    }
}

#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock body log repository holding a fixed list of logs, or failing every call
    #[derive(Debug, Default)]
    pub struct MockBodyLogRepository {
        logs: Mutex<Vec<BodyLog>>,
        should_fail: bool,
    }

    impl MockBodyLogRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_logs(logs: Vec<BodyLog>) -> Self {
            Self {
                logs: Mutex::new(logs),
                should_fail: false,
            }
        }

        /// Every call returns a database error
        pub fn failing() -> Self {
            Self {
                logs: Mutex::new(Vec::new()),
                should_fail: true,
            }
        }

        fn check(&self) -> Result<(), RepositoryError> {
            if self.should_fail {
                return Err(RepositoryError::Database(crate::database::DatabaseError::GenericError(
                    "mock database failure".to_string(),
                )));
            }
            Ok(())
        }

        fn snapshot(&self) -> Result<Vec<BodyLog>, RepositoryError> {
            self.check()?;
            Ok(self.logs.lock()?.clone())
        }
    }

    #[async_trait]
    impl BodyLogRepositoryTrait for MockBodyLogRepository {
        async fn create(&self, request: CreateBodyLogRequest) -> Result<BodyLog, RepositoryError> {
            self.check()?;
            let mut logs = self.logs.lock()?;
            if logs.iter().any(|l| l.user_id == request.user_id && l.date == request.date) {
                return Err(RepositoryError::Conflict(format!("a body log already exists for {}", request.date)));
            }
            let log = BodyLog::from_request(Uuid::new_v4().to_string(), request, Utc::now());
            logs.push(log.clone());
            Ok(log)
        }

        async fn update(&self, user_id: &str, date: NaiveDate, request: CreateBodyLogRequest) -> Result<BodyLog, RepositoryError> {
            self.check()?;
            let mut logs = self.logs.lock()?;
            let existing = logs.iter_mut()
                .find(|l| l.user_id == user_id && l.date == date)
                .ok_or_else(|| RepositoryError::NotFound(format!("no body log for {}", date)))?;
            *existing = BodyLog::from_request(existing.id.clone(), request, existing.created_at);
            Ok(existing.clone())
        }

        async fn delete(&self, user_id: &str, date: NaiveDate) -> Result<bool, RepositoryError> {
            self.check()?;
            let mut logs = self.logs.lock()?;
            let before = logs.len();
            logs.retain(|l| !(l.user_id == user_id && l.date == date));
            Ok(logs.len() != before)
        }

        async fn get_by_date(&self, user_id: &str, date: NaiveDate) -> Result<Option<BodyLog>, RepositoryError> {
            Ok(self.snapshot()?.into_iter().find(|l| l.user_id == user_id && l.date == date))
        }

        async fn list(&self, user_id: &str) -> Result<Vec<BodyLog>, RepositoryError> {
            let mut logs: Vec<BodyLog> = self.snapshot()?.into_iter().filter(|l| l.user_id == user_id).collect();
            logs.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(logs)
        }

        async fn list_between(&self, user_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<BodyLog>, RepositoryError> {
            let mut logs: Vec<BodyLog> = self.snapshot()?
                .into_iter()
                .filter(|l| l.user_id == user_id && l.date >= from && l.date <= to)
                .collect();
            logs.sort_by_key(|l| l.date);
            Ok(logs)
        }
    }
}
