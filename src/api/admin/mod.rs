mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(handlers::get_settings).put(handlers::update_settings))
        .route("/exams", post(handlers::create_exam).get(handlers::list_exams))
        .route("/exams/:exam_id", get(handlers::get_exam))
        .route("/exams/:exam_id/disable", post(handlers::disable_exam))
        .route("/results", get(handlers::list_results))
        .route("/results/:result_id", get(handlers::get_result))
        .route("/results/:result_id/disable", post(handlers::disable_result))
        .route("/candidates", post(handlers::create_candidate))
}

#[cfg(test)]
mod tests;
