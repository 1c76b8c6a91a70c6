use std::sync::Arc;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, instrument, warn};

use bulk_coach_domain::entities::coaching::{ApplySuggestionRequest, CheckStagnationRequest, DismissSuggestionRequest};
use bulk_coach_domain::services::CoachServiceTrait;

use crate::entities::{ApplySuggestionResponse, DismissSuggestionResponse, ErrorResponse, StagnationCheckResponse};

/// Service type for dependency injection
pub type CoachService = Arc<dyn CoachServiceTrait + Send + Sync>;

/// Analyze the last two weeks of weigh-ins and suggest a diet adjustment
#[utoipa::path(
    post,
    path = "/api/v1/coach/check-stagnation",
    request_body = CheckStagnationRequest,
    responses(
        (status = 200, description = "Coaching verdict", body = StagnationCheckResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 422, description = "Not enough weigh-ins for a trend", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "coach"
)]
#[instrument(skip(service, request), fields(user_id = %request.user_id))]
pub async fn check_stagnation(
    State(service): State<CoachService>,
    Json(request): Json<CheckStagnationRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    match service.check_stagnation(&request.user_id).await {
        Ok(verdict) => Ok((StatusCode::OK, Json(StagnationCheckResponse::from(verdict)))),
        Err(e) => {
            info!("No coaching verdict: {}", e);
            Err(e.into())
        }
    }
}

/// Apply a suggestion to the active diet plan
#[utoipa::path(
    post,
    path = "/api/v1/coach/apply-suggestion",
    request_body = ApplySuggestionRequest,
    responses(
        (status = 200, description = "Plan targets after the adjustment", body = ApplySuggestionResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "No active diet plan", body = ErrorResponse),
        (status = 409, description = "Suggestion is stale or would make a target negative", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "coach"
)]
#[instrument(skip(service, request), fields(user_id = %request.user_id))]
pub async fn apply_suggestion(
    State(service): State<CoachService>,
    Json(request): Json<ApplySuggestionRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    match service.apply_suggestion(request).await {
        Ok(outcome) => Ok((StatusCode::OK, Json(ApplySuggestionResponse::from(outcome)))),
        Err(e) => {
            warn!("Suggestion not applied: {}", e);
            Err(e.into())
        }
    }
}

/// Dismiss a suggestion until new weigh-ins change its anchor
#[utoipa::path(
    post,
    path = "/api/v1/coach/dismiss-suggestion",
    request_body = DismissSuggestionRequest,
    responses(
        (status = 200, description = "Suggestion dismissed", body = DismissSuggestionResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "coach"
)]
#[instrument(skip(service, request), fields(user_id = %request.user_id))]
pub async fn dismiss_suggestion(
    State(service): State<CoachService>,
    Json(request): Json<DismissSuggestionRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let record = service.dismiss_suggestion(request).await?;
    Ok((StatusCode::OK, Json(DismissSuggestionResponse::from(record))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulk_coach_domain::services::CoachServiceError;
    use bulk_coach_domain::testing::MockCoachService;

    #[tokio::test]
    async fn test_insufficient_data_is_422() {
        let service: CoachService = Arc::new(MockCoachService::new());
        let request = CheckStagnationRequest { user_id: "user-1".to_string() };

        let response = check_stagnation(State(service), Json(request)).await.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_repository_failure_is_500() {
        let service: CoachService = Arc::new(
            MockCoachService::new().with_failure(|| CoachServiceError::RepositoryError("disk full".to_string())),
        );
        let request = DismissSuggestionRequest {
            user_id: "user-1".to_string(),
            w_curr: 80.0,
            w_prev: 79.5,
        };

        let response = dismiss_suggestion(State(service), Json(request)).await.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_dismiss_echoes_anchor() {
        let service: CoachService = Arc::new(MockCoachService::new());
        let request = DismissSuggestionRequest {
            user_id: "user-1".to_string(),
            w_curr: 80.004,
            w_prev: 79.5,
        };

        let response = dismiss_suggestion(State(service), Json(request)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
