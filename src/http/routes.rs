use super::handlers;
use super::proxy;
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
        // Live interview control
        .route("/interviews/start", post(handlers::start_interview))
        .route("/interviews/next/:session_id", post(handlers::next_question))
        .route("/interviews/stop/:session_id", post(handlers::stop_interview))
        // Live interview queries
        .route(
            "/interviews/:session_id/status",
            get(handlers::interview_status),
        )
        .route(
            "/interviews/:session_id/transcript",
            get(handlers::interview_transcript),
        )
        // Durable store queries
        .route("/sessions/:mode", get(handlers::list_sessions))
        .route("/stats", get(handlers::user_stats))
        // Backend pass-through
        .route("/api/behavioral/finish", post(proxy::finish_behavioral))
        .route("/api/dashboard/stats", get(proxy::dashboard_stats))
        .route("/api/dashboard/progress", get(proxy::dashboard_progress))
        .route("/api/dashboard/activity", get(proxy::dashboard_activity))
        .route("/api/dashboard/categories", get(proxy::dashboard_categories))
        .route("/api/dashboard/behavioral", get(proxy::dashboard_behavioral))
        // Middleware: request logging + permissive CORS for the web client
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
