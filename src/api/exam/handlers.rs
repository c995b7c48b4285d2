use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::{deadline_after, format_primitive, primitive_now_utc, seconds_until};
use crate::db::models::{ExamResult, User};
use crate::db::types::ResultStatus;
use crate::repositories;
use crate::schemas::exam::PaperResponse;
use crate::schemas::result::{
    AnsweringResponse, ExamHomeResponse, ResultResponse, ScoreResponse, ScoreSummary,
    StartResponse, SubmissionResponse,
};
use crate::services::exam_session::{self, EffectiveSettings};
use crate::services::routing::{self, ExamRoute};
use crate::services::scoring::{self, Scorecard};
use crate::services::{catalog, progress};

async fn latest_result(state: &AppState, user: &User) -> Result<Option<ExamResult>, ApiError> {
    repositories::results::find_latest_active_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam result"))
}

async fn effective_settings(state: &AppState) -> Result<EffectiveSettings, ApiError> {
    let mut conn = state
        .db()
        .acquire()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to acquire database connection"))?;
    exam_session::get_settings(&mut conn, state.settings().exam().default_minutes_to_finish)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam settings"))
}

async fn require_state(
    state: &AppState,
    user: &User,
    expected: ResultStatus,
) -> Result<ExamResult, ApiError> {
    let latest = latest_result(state, user).await?;
    routing::require_status(latest.as_ref(), expected).map_err(ApiError::WrongRoute)?;
    latest.ok_or(ApiError::WrongRoute(ExamRoute::Intro))
}

pub(super) async fn home(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ExamHomeResponse>, ApiError> {
    let latest = latest_result(&state, &user).await?;
    let settings = effective_settings(&state).await?;
    let now = primitive_now_utc();

    Ok(Json(ExamHomeResponse {
        route: routing::route_for(latest.as_ref()),
        deadline_preview: format_primitive(deadline_after(now, settings.minutes_to_finish)),
        completed: progress::exam_completed(latest.as_ref()),
        settings: settings.into(),
        result: latest.as_ref().map(ResultResponse::from_db),
    }))
}

pub(super) async fn start(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<(StatusCode, Json<StartResponse>), ApiError> {
    let outcome = exam_session::get_or_create_result(&state, &user.id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start exam"))?;

    let status = if outcome.created() { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(StartResponse {
            created: outcome.created(),
            route: ExamRoute::Answering,
            result: ResultResponse::from_db(outcome.result()),
        }),
    ))
}

pub(super) async fn answering(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<AnsweringResponse>, ApiError> {
    let result = require_state(&state, &user, ResultStatus::Answering).await?;
    let settings = effective_settings(&state).await?;

    let exam = match settings.current_exam_id {
        Some(exam_id) => repositories::catalog::find_active_exam(state.db(), exam_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load exam"))?,
        None => None,
    };
    let paper: Option<PaperResponse> = match exam {
        Some(exam) => Some(
            catalog::exam_paper(state.db(), exam, false)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load exam paper"))?,
        ),
        None => None,
    };

    Ok(Json(AnsweringResponse {
        route: ExamRoute::Answering,
        seconds_remaining: seconds_until(primitive_now_utc(), result.deadline),
        result: ResultResponse::from_db(&result),
        paper,
    }))
}

pub(super) async fn submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let Form(fields) = form.map_err(|rejection| {
        tracing::warn!(user_id = %user.id, error = %rejection, "Unreadable answer sheet");
        ApiError::SubmissionRejected { status: rejection.status(), detail: rejection.body_text() }
    })?;
    let Some(result) = latest_result(&state, &user).await? else {
        return Err(ApiError::WrongRoute(ExamRoute::Intro));
    };

    let updated =
        exam_session::finish(&state, &user, &result, &fields, primitive_now_utc()).await?;

    Ok(Json(SubmissionResponse {
        route: routing::after_submission(updated.status),
        result: ResultResponse::from_db(&updated),
    }))
}

pub(super) async fn results(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ScoreResponse>, ApiError> {
    let result = require_state(&state, &user, ResultStatus::Finished).await?;
    let scorecard = Scorecard::load(state.db(), result.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to score result"))?;
    let subjects = scoring::titled_breakdown(state.db(), &scorecard)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load score breakdown"))?;

    Ok(Json(ScoreResponse {
        route: ExamRoute::Results,
        summary: ScoreSummary::new(&result, &scorecard),
        result: ResultResponse::from_db(&result),
        subjects,
    }))
}

pub(super) async fn finished(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let result = require_state(&state, &user, ResultStatus::Finished).await?;
    Ok(Json(SubmissionResponse {
        route: ExamRoute::Finished,
        result: ResultResponse::from_db(&result),
    }))
}

pub(super) async fn time_up(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let result = require_state(&state, &user, ResultStatus::TimeUp).await?;
    Ok(Json(SubmissionResponse {
        route: ExamRoute::TimeUp,
        result: ResultResponse::from_db(&result),
    }))
}
