use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use bulk_coach_domain::services::{BodyLogServiceError, CoachServiceError, DietServiceError};

/// Error response format for the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    /// Not enough weigh-ins for a trend; clients hide the coaching widget
    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::new("insufficient_data", message)
    }

    /// The suggestion is stale or would drive a target negative
    pub fn invalid_adjustment(message: impl Into<String>) -> Self {
        Self::new("invalid_adjustment", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("conflict", message)
    }

    pub fn internal_error() -> Self {
        Self::new("internal_error", "An unexpected error occurred")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "insufficient_data" => StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_adjustment" | "conflict" => StatusCode::CONFLICT,
            "validation_error" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<CoachServiceError> for ErrorResponse {
    fn from(err: CoachServiceError) -> Self {
        match err {
            CoachServiceError::InsufficientData(msg) => ErrorResponse::insufficient_data(msg),
            CoachServiceError::InvalidAdjustment(msg) => ErrorResponse::invalid_adjustment(msg),
            CoachServiceError::ValidationError(msg) => ErrorResponse::validation_error(msg),
            CoachServiceError::NotFound(msg) => ErrorResponse::not_found(msg),
            CoachServiceError::RepositoryError(msg) => {
                error!("Coach storage failure: {}", msg);
                ErrorResponse::internal_error()
            }
        }
    }
}

impl From<BodyLogServiceError> for ErrorResponse {
    fn from(err: BodyLogServiceError) -> Self {
        match err {
            BodyLogServiceError::ValidationError(msg) => ErrorResponse::validation_error(msg),
            BodyLogServiceError::NotFound(msg) => ErrorResponse::not_found(msg),
            BodyLogServiceError::Conflict(msg) => ErrorResponse::conflict(msg),
            BodyLogServiceError::RepositoryError(msg) => {
                error!("Body log storage failure: {}", msg);
                ErrorResponse::internal_error()
            }
        }
    }
}

impl From<DietServiceError> for ErrorResponse {
    fn from(err: DietServiceError) -> Self {
        match err {
            DietServiceError::ValidationError(msg) => ErrorResponse::validation_error(msg),
            DietServiceError::NotFound(msg) => ErrorResponse::not_found(msg),
            DietServiceError::RepositoryError(msg) => {
                error!("Diet storage failure: {}", msg);
                ErrorResponse::internal_error()
            }
        }
    }
}

/// Query selecting the user a request is about
#[derive(Debug, Deserialize, utoipa::IntoParams, ToSchema)]
pub struct UserQuery {
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoachServiceError::InsufficientData("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (CoachServiceError::InvalidAdjustment("x".into()), StatusCode::CONFLICT),
            (CoachServiceError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (CoachServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CoachServiceError::RepositoryError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ErrorResponse::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let response = ErrorResponse::from(DietServiceError::RepositoryError("disk I/O error".into()));
        assert_eq!(response.error, "internal_error");
        assert!(!response.message.contains("disk"));
    }

    #[test]
    fn test_conflict_is_409() {
        let response = ErrorResponse::from(BodyLogServiceError::Conflict("taken".into()));
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
