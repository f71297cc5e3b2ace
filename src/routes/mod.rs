//! Router assembly: degree/user/event endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::protocol::HealthOut;
use crate::state::AppState;

pub mod degree;
pub mod event;
pub mod user;

/// Build the application router with:
/// - REST API under `/api/v1/...`
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
///
/// One canonical route set; the GET on `/event/:id` takes a *user* id while
/// PUT/DELETE take an *event* id, which is the contract clients already use.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        // Degree catalog
        .route("/api/v1/degree", post(degree::create).get(degree::list))
        .route(
            "/api/v1/degree/:degree_id",
            get(degree::get_by_id).put(degree::edit).delete(degree::remove),
        )
        .route("/api/v1/degree/course/:course_id", get(degree::get_by_course))
        .route("/api/v1/course/:course_id", get(degree::get_course))
        // Users
        .route("/api/v1/user/signup", post(user::signup))
        .route("/api/v1/user/login", post(user::login))
        .route("/api/v1/user/forgot-password", post(user::forgot_password))
        .route("/api/v1/user", get(user::list))
        .route("/api/v1/user/role/:role", get(user::list_by_role))
        .route(
            "/api/v1/user/:user_id",
            get(user::get_by_id).put(user::edit).delete(user::remove),
        )
        .route("/api/v1/user/:user_id/add-course", post(user::add_course))
        .route("/api/v1/user/:user_id/mark-answers", post(user::mark_answers))
        .route("/api/v1/user/:user_id/validate-marks", post(user::validate_marks))
        .route("/api/v1/user/:user_id/enrolled-courses", get(user::enrolled_courses))
        // Events
        .route("/api/v1/event", post(event::create).get(event::list))
        .route(
            "/api/v1/event/:id",
            get(event::for_user).put(event::update).delete(event::remove),
        )
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

async fn health() -> Json<HealthOut> {
    Json(HealthOut { ok: true })
}
