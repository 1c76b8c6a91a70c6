use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Coaching endpoints
        crate::api::handlers::coach::check_stagnation,
        crate::api::handlers::coach::apply_suggestion,
        crate::api::handlers::coach::dismiss_suggestion,

        // Body log endpoints
        crate::api::handlers::body_logs::create_body_log,
        crate::api::handlers::body_logs::list_body_logs,
        crate::api::handlers::body_logs::get_body_log,
        crate::api::handlers::body_logs::update_body_log,
        crate::api::handlers::body_logs::delete_body_log,

        // Food and diet plan endpoints
        crate::api::handlers::diet::create_food,
        crate::api::handlers::diet::list_foods,
        crate::api::handlers::diet::get_food,
        crate::api::handlers::diet::delete_food,
        crate::api::handlers::diet::create_plan,
        crate::api::handlers::diet::get_current_plan,
        crate::api::handlers::diet::update_plan_targets,
        crate::api::handlers::diet::add_meal,
        crate::api::handlers::diet::rename_meal,
        crate::api::handlers::diet::delete_meal,
        crate::api::handlers::diet::add_meal_item,
        crate::api::handlers::diet::update_meal_item,
        crate::api::handlers::diet::delete_meal_item
    ),
    components(
        schemas(
            // Entities
            crate::entities::common::ErrorResponse,
            crate::entities::common::UserQuery,
            crate::entities::coach::StagnationCheckResponse,
            crate::entities::coach::ApplySuggestionResponse,
            crate::entities::coach::DismissSuggestionResponse,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,

            // Domain requests and records
            bulk_coach_domain::entities::coaching::AnalysisState,
            bulk_coach_domain::entities::coaching::CheckStagnationRequest,
            bulk_coach_domain::entities::coaching::ApplySuggestionRequest,
            bulk_coach_domain::entities::coaching::DismissSuggestionRequest,
            bulk_coach_domain::entities::body_log::BodyLogEntry,
            bulk_coach_domain::entities::body_log::CreateBodyLogRequest,
            bulk_coach_domain::entities::body_log::Skinfolds,
            bulk_coach_domain::entities::body_log::Circumferences,
            bulk_coach_domain::entities::diet::FoodItem,
            bulk_coach_domain::entities::diet::CreateFoodItemRequest,
            bulk_coach_domain::entities::diet::DietPlan,
            bulk_coach_domain::entities::diet::DietVariation,
            bulk_coach_domain::entities::diet::Meal,
            bulk_coach_domain::entities::diet::MealItem,
            bulk_coach_domain::entities::diet::CreateDietPlanRequest,
            bulk_coach_domain::entities::diet::CreateDietVariation,
            bulk_coach_domain::entities::diet::CreateMeal,
            bulk_coach_domain::entities::diet::CreateMealItem,
            bulk_coach_domain::entities::diet::NutrientTotals,
            bulk_coach_domain::entities::diet::MacroComparison,
            bulk_coach_domain::entities::diet::MacroComparisons,
            bulk_coach_domain::entities::diet::MealSummary,
            bulk_coach_domain::entities::diet::VariationSummary,
            bulk_coach_domain::entities::diet::DietPlanDetails,
            bulk_coach_domain::entities::diet::CreateMealRequest,
            bulk_coach_domain::entities::diet::RenameMealRequest,
            bulk_coach_domain::entities::diet::UpdateMealItemRequest,
            bulk_coach_domain::entities::diet::UpdateTargetsRequest,
            bulk_coach_domain::entities::diet::MealDetails,
            bulk_coach_domain::entities::diet::MealItemDetails,
            crate::api::handlers::diet::FoodSearchParams
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "coach", description = "Weight trend analysis and diet adjustment suggestions"),
        (name = "body_logs", description = "Daily weight and body measurements"),
        (name = "diet", description = "Food catalogue and diet plans")
    ),
    info(
        title = "BulkCoach API",
        version = "0.1.0",
        description = "Bulking coach: diet plans, body logs and weight-trend coaching",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_doc_generation() {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "BulkCoach API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi.tags.as_ref().unwrap();
        assert!(tags.iter().any(|tag| tag.name == "coach"));
        assert!(tags.iter().any(|tag| tag.name == "diet"));

        for path in [
            "/health",
            "/api/v1/coach/check-stagnation",
            "/api/v1/coach/apply-suggestion",
            "/api/v1/coach/dismiss-suggestion",
            "/api/v1/body-logs",
            "/api/v1/body-logs/{date}",
            "/api/v1/foods",
            "/api/v1/foods/{id}",
            "/api/v1/diet/plans",
            "/api/v1/diet/current",
            "/api/v1/diet/plans/{id}/targets",
            "/api/v1/diet/plans/{id}/meals",
            "/api/v1/diet/meals/{id}",
            "/api/v1/diet/meals/{id}/items",
            "/api/v1/diet/meal-items/{id}",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing path {}", path);
        }
    }
}
