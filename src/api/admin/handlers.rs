use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{ListQuery, PaginatedResponse};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::results::ResultListing;
use crate::schemas::exam::{
    ExamResponse, ExamTreeCreate, PaperResponse, SettingsResponse, SettingsUpdate,
};
use crate::schemas::result::{ResultReportDetail, ResultReportRow, ResultResponse, ScoreSummary};
use crate::schemas::user::{CandidateCreate, UserResponse};
use crate::services::scoring::{self, Scorecard};
use crate::services::{catalog, exam_session};

#[derive(Debug, Deserialize)]
pub(super) struct DisabledFilter {
    #[serde(default)]
    #[serde(alias = "includeDisabled")]
    include_disabled: bool,
}

pub(super) async fn get_settings(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<SettingsResponse>, ApiError> {
    let mut conn = state
        .db()
        .acquire()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to acquire database connection"))?;
    let settings =
        exam_session::get_settings(&mut conn, state.settings().exam().default_minutes_to_finish)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load exam settings"))?;
    Ok(Json(settings.into()))
}

pub(super) async fn update_settings(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<SettingsUpdate>,
) -> Result<Json<SettingsResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let settings = exam_session::upsert_settings(
        state.db(),
        payload.current_exam_id,
        payload.minutes_to_finish,
        primitive_now_utc(),
    )
    .await?;

    tracing::info!(admin_id = %admin.id, "Exam settings changed");
    Ok(Json(settings.into()))
}

pub(super) async fn create_exam(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<ExamTreeCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let exam = catalog::create_exam_tree(state.db(), &payload, primitive_now_utc()).await?;

    tracing::info!(admin_id = %admin.id, exam_id = exam.id, "Exam created");
    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam))))
}

pub(super) async fn list_exams(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(filter): Query<DisabledFilter>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let exams = if filter.include_disabled {
        repositories::catalog::list_all_exams(state.db()).await
    } else {
        repositories::catalog::list_active_exams(state.db()).await
    }
    .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(exams.into_iter().map(ExamResponse::from_db).collect()))
}

pub(super) async fn get_exam(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(exam_id): Path<i64>,
) -> Result<Json<PaperResponse>, ApiError> {
    let exam = repositories::catalog::find_exam_any(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let paper = catalog::exam_paper(state.db(), exam, true)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam paper"))?;
    Ok(Json(paper))
}

pub(super) async fn disable_exam(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(exam_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let disabled = repositories::catalog::disable_exam(state.db(), exam_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to disable exam"))?;

    if !disabled {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    tracing::info!(admin_id = %admin.id, exam_id, "Exam disabled");
    Ok(StatusCode::NO_CONTENT)
}

async fn report_row(
    state: &AppState,
    listing: ResultListing,
) -> Result<(ResultReportRow, Scorecard), ApiError> {
    let scorecard = Scorecard::load(state.db(), listing.result.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to score result"))?;

    let row = ResultReportRow {
        summary: ScoreSummary::new(&listing.result, &scorecard),
        result: ResultResponse::from_db(&listing.result),
        username: listing.username,
        full_name: listing.full_name,
        email: listing.email,
    };
    Ok((row, scorecard))
}

pub(super) async fn list_results(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<ResultReportRow>>, ApiError> {
    let (skip, limit) = query.window();

    let listings = if query.include_disabled {
        repositories::results::list_all(state.db(), skip, limit).await
    } else {
        repositories::results::list_active(state.db(), skip, limit).await
    }
    .map_err(|e| ApiError::internal(e, "Failed to list results"))?;
    let total_count = repositories::results::count(state.db(), query.include_disabled)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count results"))?;

    let mut items = Vec::with_capacity(listings.len());
    for listing in listings {
        let (row, _) = report_row(&state, listing).await?;
        items.push(row);
    }

    Ok(Json(PaginatedResponse { items, total_count, skip, limit }))
}

pub(super) async fn get_result(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(result_id): Path<i64>,
) -> Result<Json<ResultReportDetail>, ApiError> {
    let listing = repositories::results::find_listing(state.db(), result_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load result"))?
        .ok_or_else(|| ApiError::NotFound("Result not found".to_string()))?;

    let (row, scorecard) = report_row(&state, listing).await?;
    let subjects = scoring::titled_breakdown(state.db(), &scorecard)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load score breakdown"))?;

    Ok(Json(ResultReportDetail { row, subjects }))
}

/// Grants a retake: the disabled result no longer counts as the candidate's attempt.
pub(super) async fn disable_result(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(result_id): Path<i64>,
) -> Result<Json<ResultResponse>, ApiError> {
    let result = repositories::results::disable(state.db(), result_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to disable result"))?
        .ok_or_else(|| ApiError::NotFound("Result not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.id,
        result_id,
        user_id = %result.user_id,
        "Result disabled; retake granted"
    );
    Ok(Json(ResultResponse::from_db(&result)))
}

pub(super) async fn create_candidate(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<CandidateCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let username = payload.username.trim();
    let existing = repositories::users::find_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User with this username already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let now = primitive_now_utc();

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            hashed_password,
            full_name: &payload.full_name,
            email: payload.email.as_deref(),
            is_staff: payload.is_staff,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    tracing::info!(admin_id = %admin.id, user_id = %user.id, "Candidate account created");
    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}
