// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{exam, notification},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Exam routes address `<subject>/<exam>` as two path segments.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (exam repository, notifier, config).
pub fn create_router(state: AppState) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    match HeaderValue::from_str(&state.config.public_base_url.origin().ascii_serialization()) {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => tracing::warn!("CORS disabled, invalid public origin: {}", e),
    }

    let exam_routes = Router::new()
        .route("/", get(exam::list_exams))
        .route("/{subject}/{exam}", get(exam::get_exam))
        .route("/{subject}/{exam}/questions", get(exam::get_questions))
        .route("/{subject}/{exam}/finish", post(exam::finish_exam))
        .route("/{subject}/{exam}/answers/{student}", get(exam::get_answers))
        .route(
            "/{subject}/{exam}/answers/{student}/{question}",
            put(exam::save_answer),
        );

    let notification_routes =
        Router::new().route("/points-assigned", post(notification::points_assigned));

    Router::new()
        .nest("/api/exams", exam_routes)
        .nest("/api/notifications", notification_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
