mod handlers;

use axum::{routing::get, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home).post(handlers::start))
        .route("/answering", get(handlers::answering).post(handlers::submit))
        .route("/results", get(handlers::results))
        .route("/finished", get(handlers::finished))
        .route("/time-up", get(handlers::time_up))
}
