//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Enrollments
        .route("/enrollments", post(handlers::open_enrollment))
        .route("/enrollments/:id", get(handlers::get_enrollment))
        .route(
            "/enrollments/:id/transitions",
            post(handlers::request_transition),
        )
        .route("/enrollments/:id/subjects", put(handlers::select_subjects))
        .route("/enrollments/:id/section", post(handlers::assign_section))
        .route("/enrollments/:id/actions", get(handlers::legal_actions))
        .route("/enrollments/:id/history", get(handlers::get_history));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}
