pub mod handlers;
pub mod routes;

use axum::Router;

/// Create the application router over storage selected from the environment
pub async fn create_application() -> Router {
    routes::create_app().await
}
