use axum::{
    extract::FromRef,
    routing::{get, patch, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use bulk_coach_data::repository::StorageBackend;
use bulk_coach_domain::clock::{Clock, SystemClock};
use bulk_coach_domain::config::CoachConfig;
use bulk_coach_domain::services::{create_coach_service, create_default_body_log_service, create_default_diet_service};

use crate::api::handlers::body_logs::{self, BodyLogService};
use crate::api::handlers::coach::{self, CoachService};
use crate::api::handlers::diet::{self, DietService};
use crate::api::handlers::health::{self, SharedHealthService};
use crate::openapi::configure_swagger_routes;

/// Services shared by the handlers, all over one storage backend
#[derive(Clone, FromRef)]
pub struct AppState {
    pub coach: CoachService,
    pub body_logs: BodyLogService,
    pub diet: DietService,
}

impl AppState {
    pub fn new(backend: StorageBackend, config: CoachConfig, clock: Arc<dyn Clock>) -> Self {
        info!("Building services on {} storage", backend.describe());

        Self {
            coach: Arc::new(create_coach_service(backend.clone(), config.clone(), clock)),
            body_logs: Arc::new(create_default_body_log_service(backend.clone(), config)),
            diet: Arc::new(create_default_diet_service(backend)),
        }
    }

    /// Storage from the global pool when initialized, otherwise in memory
    pub fn from_environment() -> Self {
        Self::new(StorageBackend::from_environment(), CoachConfig::from_env(), Arc::new(SystemClock))
    }
}

/// Create the application router
pub async fn create_app() -> Router {
    debug!("Creating application router");

    let app = create_router(AppState::from_environment(), health::create_health_service());
    health::initialize_server_start_time();

    app
}

/// Assemble routes, documentation and middleware around the given services
pub fn create_router(state: AppState, health_service: SharedHealthService) -> Router {
    let api_routes = Router::new()
        .route("/coach/check-stagnation", post(coach::check_stagnation))
        .route("/coach/apply-suggestion", post(coach::apply_suggestion))
        .route("/coach/dismiss-suggestion", post(coach::dismiss_suggestion))
        .route("/body-logs", get(body_logs::list_body_logs).post(body_logs::create_body_log))
        .route(
            "/body-logs/:date",
            get(body_logs::get_body_log)
                .put(body_logs::update_body_log)
                .delete(body_logs::delete_body_log),
        )
        .route("/foods", get(diet::list_foods).post(diet::create_food))
        .route("/foods/:id", get(diet::get_food).delete(diet::delete_food))
        .route("/diet/plans", post(diet::create_plan))
        .route("/diet/plans/:id/targets", put(diet::update_plan_targets))
        .route("/diet/plans/:id/meals", post(diet::add_meal))
        .route("/diet/meals/:id", patch(diet::rename_meal).delete(diet::delete_meal))
        .route("/diet/meals/:id/items", post(diet::add_meal_item))
        .route("/diet/meal-items/:id", put(diet::update_meal_item).delete(diet::delete_meal_item))
        .route("/diet/current", get(diet::get_current_plan));

    debug!("API routes configured");

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .layer(Extension(health_service));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .with_state(state)
        .merge(configure_swagger_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
