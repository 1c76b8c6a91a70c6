use thiserror::Error;
use tracing::{debug, error, info};
use chrono::NaiveDate;
use validator::Validate;
use async_trait::async_trait;

use bulk_coach_data::repository::{BodyLogRepository, BodyLogRepositoryTrait, RepositoryError, StorageBackend};

use crate::config::CoachConfig;
use crate::entities::body_log::{BodyLogEntry, CreateBodyLogRequest};
use crate::entities::conversions;
use crate::services::body_fat;
use crate::services::validation_message;

/// Body log service errors
#[derive(Debug, Error)]
pub enum BodyLogServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Body log not found: {0}")]
    NotFound(String),

    /// A log already exists for that user and day
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),
}

/// Trait for body log operations
#[async_trait]
pub trait BodyLogServiceTrait: Send + Sync {
    /// Record the measurements of one day, deriving body fat from complete skinfolds
    async fn create_log(&self, request: CreateBodyLogRequest) -> Result<BodyLogEntry, BodyLogServiceError>;

    /// Replace the log of `date`, recomputing the derived values
    async fn update_log(
        &self,
        user_id: &str,
        date: NaiveDate,
        request: CreateBodyLogRequest,
    ) -> Result<BodyLogEntry, BodyLogServiceError>;

    async fn get_log(&self, user_id: &str, date: NaiveDate) -> Result<BodyLogEntry, BodyLogServiceError>;

    /// All logs of a user, newest first
    async fn list_logs(&self, user_id: &str) -> Result<Vec<BodyLogEntry>, BodyLogServiceError>;

    async fn delete_log(&self, user_id: &str, date: NaiveDate) -> Result<(), BodyLogServiceError>;
}

/// Body log service for domain logic
pub struct BodyLogService<R: BodyLogRepositoryTrait> {
    repository: R,
    config: CoachConfig,
}

impl<R: BodyLogRepositoryTrait> BodyLogService<R> {
    pub fn new(repository: R, config: CoachConfig) -> Self {
        Self { repository, config }
    }

    fn map_repo_error(&self, err: RepositoryError) -> BodyLogServiceError {
        match err {
            RepositoryError::NotFound(msg) => BodyLogServiceError::NotFound(msg),
            RepositoryError::Validation(msg) => BodyLogServiceError::ValidationError(msg),
            RepositoryError::Conflict(msg) => BodyLogServiceError::Conflict(msg),
            _ => {
                error!("Body log storage failure: {}", err);
                BodyLogServiceError::RepositoryError(err.to_string())
            }
        }
    }

    fn prepare(&self, request: &CreateBodyLogRequest) -> Result<bulk_coach_data::models::body_log::CreateBodyLogRequest, BodyLogServiceError> {
        request.validate().map_err(|e| BodyLogServiceError::ValidationError(validation_message(&e)))?;

        let estimate = body_fat::estimate(&request.skinfolds, self.config.subject_age_years);
        if let Some(estimate) = &estimate {
            debug!(
                density = estimate.body_density,
                body_fat = estimate.body_fat_percent,
                "Derived body fat from skinfolds"
            );
        }

        Ok(conversions::convert_to_data_body_log_request(
            request,
            estimate.as_ref().map(|e| e.body_density),
            estimate.as_ref().map(|e| e.body_fat_percent),
        ))
    }
}

#[async_trait]
impl<R: BodyLogRepositoryTrait> BodyLogServiceTrait for BodyLogService<R> {
    async fn create_log(&self, request: CreateBodyLogRequest) -> Result<BodyLogEntry, BodyLogServiceError> {
        let data_request = self.prepare(&request)?;

        let log = self.repository
            .create(data_request)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!(user_id = %log.user_id, date = %log.date, weight_kg = log.weight_kg, "Body log recorded");
        Ok(conversions::convert_to_domain_body_log(log))
    }

    async fn update_log(
        &self,
        user_id: &str,
        date: NaiveDate,
        request: CreateBodyLogRequest,
    ) -> Result<BodyLogEntry, BodyLogServiceError> {
        if request.user_id != user_id {
            return Err(BodyLogServiceError::ValidationError(
                "user_id of the body does not match the log being edited".to_string(),
            ));
        }
        let data_request = self.prepare(&request)?;

        let log = self.repository
            .update(user_id, date, data_request)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!(user_id, date = %date, "Body log updated");
        Ok(conversions::convert_to_domain_body_log(log))
    }

    async fn get_log(&self, user_id: &str, date: NaiveDate) -> Result<BodyLogEntry, BodyLogServiceError> {
        self.repository
            .get_by_date(user_id, date)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(conversions::convert_to_domain_body_log)
            .ok_or_else(|| BodyLogServiceError::NotFound(format!("no body log for {} on {}", user_id, date)))
    }

    async fn list_logs(&self, user_id: &str) -> Result<Vec<BodyLogEntry>, BodyLogServiceError> {
        let logs = self.repository
            .list(user_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(logs.into_iter().map(conversions::convert_to_domain_body_log).collect())
    }

    async fn delete_log(&self, user_id: &str, date: NaiveDate) -> Result<(), BodyLogServiceError> {
        let deleted = self.repository
            .delete(user_id, date)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        if !deleted {
            return Err(BodyLogServiceError::NotFound(format!("no body log for {} on {}", user_id, date)));
        }

        info!(user_id, date = %date, "Body log deleted");
        Ok(())
    }
}

/// Create the body log service over a shared storage backend
pub fn create_default_body_log_service(
    backend: StorageBackend,
    config: CoachConfig,
) -> BodyLogService<BodyLogRepository> {
    BodyLogService::new(BodyLogRepository::new(backend), config)
}
