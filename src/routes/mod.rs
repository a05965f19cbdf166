pub mod home;
pub mod threads;
pub mod topics;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_sign_in;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    // Everything past sign-in needs an identity
    let signed_in = Router::new()
        .route("/topics", get(topics::topics_page))
        .route("/add-topic", post(topics::add_topic))
        .route("/topics/{id}", get(topics::one_topic_page))
        .route("/add-thread", post(threads::add_thread))
        .route("/threads/{id}", get(threads::one_thread_page))
        .route("/add-post", post(threads::add_post))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_sign_in,
        ));

    let static_dir = state.config.static_dir();
    let timeout = state.config.request_timeout();

    Router::new()
        .route("/", get(home::home_page))
        .route("/sign-in", post(home::sign_in))
        .merge(signed_in)
        .nest_service("/css", ServeDir::new(static_dir.join("css")))
        .nest_service("/js", ServeDir::new(static_dir.join("js")))
        .nest_service("/img", ServeDir::new(static_dir.join("img")))
        .fallback(home::not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::INTERNAL_SERVER_ERROR,
            timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The ID in the second segment of a path like `/topics/12`.
pub fn path_id(path: &str) -> AppResult<i64> {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() < 3 {
        return Err(AppError::MissingId(path.to_string()));
    }
    parse_id(parts[2])
}

/// Parse an ID submitted in a form field.
pub fn parse_id(value: &str) -> AppResult<i64> {
    value
        .parse::<i64>()
        .map_err(|_| AppError::InvalidId(value.to_string()))
}
