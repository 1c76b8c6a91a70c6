use std::sync::Arc;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use bulk_coach_domain::entities::body_log::{BodyLogEntry, CreateBodyLogRequest};
use bulk_coach_domain::services::BodyLogServiceTrait;

use crate::entities::{ErrorResponse, UserQuery};

/// Service type for dependency injection
pub type BodyLogService = Arc<dyn BodyLogServiceTrait + Send + Sync>;

fn parse_date(raw: &str) -> Result<NaiveDate, ErrorResponse> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ErrorResponse::validation_error(format!("Invalid date '{}'. Use YYYY-MM-DD", raw)))
}

/// Record the body measurements of one day
#[utoipa::path(
    post,
    path = "/api/v1/body-logs",
    request_body = CreateBodyLogRequest,
    responses(
        (status = 201, description = "Body log created", body = BodyLogEntry),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "A log already exists for that day", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "body_logs"
)]
#[instrument(skip(service, request))]
pub async fn create_body_log(
    State(service): State<BodyLogService>,
    Json(request): Json<CreateBodyLogRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    match service.create_log(request).await {
        Ok(log) => {
            info!("Body log created with ID: {}", log.id);
            Ok((StatusCode::CREATED, Json(log)))
        }
        Err(e) => {
            warn!("Body log rejected: {}", e);
            Err(e.into())
        }
    }
}

/// List a user's body logs, newest first
#[utoipa::path(
    get,
    path = "/api/v1/body-logs",
    params(UserQuery),
    responses(
        (status = 200, description = "Body logs", body = Vec<BodyLogEntry>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "body_logs"
)]
#[instrument(skip(service))]
pub async fn list_body_logs(
    State(service): State<BodyLogService>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let logs = service.list_logs(&query.user_id).await?;
    Ok(Json(logs))
}

/// Get the body log of one day
#[utoipa::path(
    get,
    path = "/api/v1/body-logs/{date}",
    params(
        ("date" = String, Path, description = "Log date, YYYY-MM-DD"),
        UserQuery
    ),
    responses(
        (status = 200, description = "Body log found", body = BodyLogEntry),
        (status = 400, description = "Invalid date", body = ErrorResponse),
        (status = 404, description = "No log for that day", body = ErrorResponse),
    ),
    tag = "body_logs"
)]
#[instrument(skip(service))]
pub async fn get_body_log(
    State(service): State<BodyLogService>,
    Path(date): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let date = parse_date(&date)?;
    let log = service.get_log(&query.user_id, date).await?;
    Ok(Json(log))
}

/// Replace the body log of one day; derived body fat is recomputed
#[utoipa::path(
    put,
    path = "/api/v1/body-logs/{date}",
    params(
        ("date" = String, Path, description = "Date of the log to edit, YYYY-MM-DD"),
        UserQuery
    ),
    request_body = CreateBodyLogRequest,
    responses(
        (status = 200, description = "Body log updated", body = BodyLogEntry),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "No log for that day", body = ErrorResponse),
        (status = 409, description = "The new date already has a log", body = ErrorResponse),
    ),
    tag = "body_logs"
)]
#[instrument(skip(service, request))]
pub async fn update_body_log(
    State(service): State<BodyLogService>,
    Path(date): Path<String>,
    Query(query): Query<UserQuery>,
    Json(request): Json<CreateBodyLogRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let date = parse_date(&date)?;
    let log = service.update_log(&query.user_id, date, request).await?;
    Ok(Json(log))
}

/// Delete the body log of one day
#[utoipa::path(
    delete,
    path = "/api/v1/body-logs/{date}",
    params(
        ("date" = String, Path, description = "Date of the log to delete, YYYY-MM-DD"),
        UserQuery
    ),
    responses(
        (status = 204, description = "Body log deleted"),
        (status = 404, description = "No log for that day", body = ErrorResponse),
    ),
    tag = "body_logs"
)]
#[instrument(skip(service))]
pub async fn delete_body_log(
    State(service): State<BodyLogService>,
    Path(date): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let date = parse_date(&date)?;
    service.delete_log(&query.user_id, date).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-20").unwrap(), NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        assert_eq!(parse_date("20-03-2024").unwrap_err().error, "validation_error");
        assert!(parse_date("2024-02-30").is_err());
    }
}
