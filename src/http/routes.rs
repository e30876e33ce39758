use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Question bank + history
        .route("/questions", get(handlers::list_questions))
        .route("/questions/:question_id", get(handlers::get_question))
        .route("/history", get(handlers::get_history))
        // Session lifecycle
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:session_id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        // Media controls
        .route(
            "/sessions/:session_id/media/acquire",
            post(handlers::acquire_media),
        )
        .route(
            "/sessions/:session_id/media/video/toggle",
            post(handlers::toggle_video),
        )
        .route(
            "/sessions/:session_id/media/mic/toggle",
            post(handlers::toggle_mic),
        )
        // Recording control
        .route(
            "/sessions/:session_id/recording/start",
            post(handlers::start_recording),
        )
        .route(
            "/sessions/:session_id/recording/stop",
            post(handlers::stop_recording),
        )
        .route(
            "/sessions/:session_id/submission/retry",
            post(handlers::retry_submission),
        )
        .route(
            "/sessions/:session_id/submission/discard",
            post(handlers::discard_submission),
        )
        .route("/sessions/:session_id/report", get(handlers::get_report))
        // The UI is served from another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
