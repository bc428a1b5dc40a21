use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Interview lifecycle
        .route(
            "/interviews",
            post(handlers::create_interview).get(handlers::list_interviews),
        )
        .route("/interviews/:room_id", get(handlers::get_interview))
        .route("/interviews/:room_id/start", post(handlers::start_interview))
        .route("/interviews/:room_id/end", post(handlers::end_interview))
        .route("/interviews/:room_id/cancel", post(handlers::cancel_interview))
        // Live session inputs
        .route("/interviews/:room_id/events", post(handlers::push_call_event))
        .route("/interviews/:room_id/code", put(handlers::put_code))
        .route("/interviews/:room_id/transcript", put(handlers::put_transcript))
        .route("/interviews/:room_id/analysis", post(handlers::post_analysis))
        // Statistics
        .route("/users/me/stats", get(handlers::get_user_stats))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
