use std::sync::Arc;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use bulk_coach_domain::entities::diet::{
    CreateDietPlanRequest, CreateFoodItemRequest, CreateMealItem, CreateMealRequest, DietPlanDetails, FoodItem,
    MealDetails, MealItemDetails, RenameMealRequest, UpdateMealItemRequest, UpdateTargetsRequest,
};
use bulk_coach_domain::services::DietServiceTrait;

use crate::entities::{ErrorResponse, UserQuery};

/// Service type for dependency injection
pub type DietService = Arc<dyn DietServiceTrait + Send + Sync>;

/// Query parameters for the food catalogue
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct FoodSearchParams {
    /// Case-insensitive fragment of the food name
    pub search: Option<String>,
}

/// Add a food to the catalogue
#[utoipa::path(
    post,
    path = "/api/v1/foods",
    request_body = CreateFoodItemRequest,
    responses(
        (status = 201, description = "Food created", body = FoodItem),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service, request))]
pub async fn create_food(
    State(service): State<DietService>,
    Json(request): Json<CreateFoodItemRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let food = service.create_food(request).await?;
    Ok((StatusCode::CREATED, Json(food)))
}

/// List catalogue foods by name
#[utoipa::path(
    get,
    path = "/api/v1/foods",
    params(FoodSearchParams),
    responses(
        (status = 200, description = "Foods", body = Vec<FoodItem>),
    ),
    tag = "diet"
)]
#[instrument(skip(service))]
pub async fn list_foods(
    State(service): State<DietService>,
    Query(params): Query<FoodSearchParams>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let foods = service.list_foods(params.search).await?;
    Ok(Json(foods))
}

#[utoipa::path(
    get,
    path = "/api/v1/foods/{id}",
    params(("id" = String, Path, description = "Food ID")),
    responses(
        (status = 200, description = "Food found", body = FoodItem),
        (status = 404, description = "Food not found", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service))]
pub async fn get_food(
    State(service): State<DietService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let food = service.get_food(&id).await?;
    Ok(Json(food))
}

/// Delete a food and every meal item using it
#[utoipa::path(
    delete,
    path = "/api/v1/foods/{id}",
    params(("id" = String, Path, description = "Food ID")),
    responses(
        (status = 204, description = "Food deleted"),
        (status = 404, description = "Food not found", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service))]
pub async fn delete_food(
    State(service): State<DietService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    service.delete_food(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a diet plan; it replaces the user's active plan
#[utoipa::path(
    post,
    path = "/api/v1/diet/plans",
    request_body = CreateDietPlanRequest,
    responses(
        (status = 201, description = "Plan created and activated", body = DietPlanDetails),
        (status = 400, description = "Invalid request or unknown food", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service, request), fields(user_id = %request.user_id))]
pub async fn create_plan(
    State(service): State<DietService>,
    Json(request): Json<CreateDietPlanRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let details = service.create_plan(request).await?;
    info!("Diet plan {} is now active", details.plan.id);
    Ok((StatusCode::CREATED, Json(details)))
}

/// The active plan with derived totals and target comparisons
#[utoipa::path(
    get,
    path = "/api/v1/diet/current",
    params(UserQuery),
    responses(
        (status = 200, description = "Active plan", body = DietPlanDetails),
        (status = 404, description = "No active plan", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service))]
pub async fn get_current_plan(
    State(service): State<DietService>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let details = service.get_current_plan(&query.user_id).await?;
    Ok(Json(details))
}

/// Overwrite some or all targets of a plan
#[utoipa::path(
    put,
    path = "/api/v1/diet/plans/{id}/targets",
    params(("id" = String, Path, description = "Diet plan ID")),
    request_body = UpdateTargetsRequest,
    responses(
        (status = 200, description = "Targets updated", body = DietPlanDetails),
        (status = 400, description = "Invalid targets", body = ErrorResponse),
        (status = 404, description = "Plan not found", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service, request))]
pub async fn update_plan_targets(
    State(service): State<DietService>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTargetsRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let details = service.update_targets(&id, request).await?;
    Ok(Json(details))
}

/// Add an empty meal to a plan
#[utoipa::path(
    post,
    path = "/api/v1/diet/plans/{id}/meals",
    params(("id" = String, Path, description = "Diet plan ID")),
    request_body = CreateMealRequest,
    responses(
        (status = 201, description = "Meal added", body = MealDetails),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Plan or variation not found", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service, request))]
pub async fn add_meal(
    State(service): State<DietService>,
    Path(id): Path<String>,
    Json(request): Json<CreateMealRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let meal = service.add_meal(&id, request).await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/diet/meals/{id}",
    params(("id" = String, Path, description = "Meal ID")),
    request_body = RenameMealRequest,
    responses(
        (status = 200, description = "Meal renamed", body = MealDetails),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 404, description = "Meal not found", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service, request))]
pub async fn rename_meal(
    State(service): State<DietService>,
    Path(id): Path<String>,
    Json(request): Json<RenameMealRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let meal = service.rename_meal(&id, request).await?;
    Ok(Json(meal))
}

/// Delete a meal and all of its items
#[utoipa::path(
    delete,
    path = "/api/v1/diet/meals/{id}",
    params(("id" = String, Path, description = "Meal ID")),
    responses(
        (status = 204, description = "Meal deleted"),
        (status = 404, description = "Meal not found", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service))]
pub async fn delete_meal(
    State(service): State<DietService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    service.delete_meal(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a quantity of a catalogue food to a meal
#[utoipa::path(
    post,
    path = "/api/v1/diet/meals/{id}/items",
    params(("id" = String, Path, description = "Meal ID")),
    request_body = CreateMealItem,
    responses(
        (status = 201, description = "Item added", body = MealItemDetails),
        (status = 400, description = "Invalid quantity", body = ErrorResponse),
        (status = 404, description = "Meal or food not found", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service, request))]
pub async fn add_meal_item(
    State(service): State<DietService>,
    Path(id): Path<String>,
    Json(request): Json<CreateMealItem>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let item = service.add_meal_item(&id, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Change the quantity of a meal item
#[utoipa::path(
    put,
    path = "/api/v1/diet/meal-items/{id}",
    params(("id" = String, Path, description = "Meal item ID")),
    request_body = UpdateMealItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = MealItemDetails),
        (status = 400, description = "Invalid quantity", body = ErrorResponse),
        (status = 404, description = "Meal item not found", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service, request))]
pub async fn update_meal_item(
    State(service): State<DietService>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMealItemRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let item = service.update_meal_item(&id, request).await?;
    Ok(Json(item))
}

/// Remove an item from its meal; the food stays in the catalogue
#[utoipa::path(
    delete,
    path = "/api/v1/diet/meal-items/{id}",
    params(("id" = String, Path, description = "Meal item ID")),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "Meal item not found", body = ErrorResponse),
    ),
    tag = "diet"
)]
#[instrument(skip(service))]
pub async fn delete_meal_item(
    State(service): State<DietService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    service.delete_meal_item(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
