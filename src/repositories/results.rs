use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::ExamResult;
use crate::db::types::ResultStatus;

const COLUMNS: &str = "\
    id, user_id, status, start_time, end_time, deadline, disabled, created_at, updated_at";

/// Serializes result creation for one candidate until the transaction ends.
pub(crate) async fn acquire_user_lock(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn find_latest_active_for_user(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
) -> Result<Option<ExamResult>, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {COLUMNS} FROM results
         WHERE user_id = $1 AND NOT disabled
         ORDER BY id DESC
         LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateResult<'a> {
    pub(crate) user_id: &'a str,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) deadline: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateResult<'_>,
) -> Result<ExamResult, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "INSERT INTO results (user_id, status, start_time, end_time, deadline, created_at, updated_at)
         VALUES ($1, $2, $3, NULL, $4, $3, $3)
         RETURNING {COLUMNS}"
    ))
    .bind(params.user_id)
    .bind(ResultStatus::Answering)
    .bind(params.start_time)
    .bind(params.deadline)
    .fetch_one(executor)
    .await
}

/// Moves an answering, active result into a terminal status.
///
/// Returns `None` when the row was already terminal or disabled.
pub(crate) async fn complete(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
    status: ResultStatus,
    end_time: PrimitiveDateTime,
) -> Result<Option<ExamResult>, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "UPDATE results
         SET status = $1, end_time = $2, updated_at = $2
         WHERE id = $3 AND status = $4 AND NOT disabled
         RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(end_time)
    .bind(id)
    .bind(ResultStatus::Answering)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn disable(
    pool: &PgPool,
    id: i64,
    now: PrimitiveDateTime,
) -> Result<Option<ExamResult>, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "UPDATE results SET disabled = TRUE, updated_at = $1
         WHERE id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// A result row with the candidate's display fields, for reports.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ResultListing {
    #[sqlx(flatten)]
    pub(crate) result: ExamResult,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) email: Option<String>,
}

const LISTING_SELECT: &str = "\
    SELECT r.id, r.user_id, r.status, r.start_time, r.end_time, r.deadline, r.disabled,
           r.created_at, r.updated_at, u.username, u.full_name, u.email
    FROM results r
    JOIN users u ON u.id = r.user_id";

pub(crate) async fn list_active(
    pool: &PgPool,
    skip: i64,
    limit: i64,
) -> Result<Vec<ResultListing>, sqlx::Error> {
    sqlx::query_as::<_, ResultListing>(&format!(
        "{LISTING_SELECT}
         WHERE NOT r.disabled
         ORDER BY r.id DESC
         OFFSET $1 LIMIT $2"
    ))
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_all(
    pool: &PgPool,
    skip: i64,
    limit: i64,
) -> Result<Vec<ResultListing>, sqlx::Error> {
    sqlx::query_as::<_, ResultListing>(&format!(
        "{LISTING_SELECT}
         ORDER BY r.id DESC
         OFFSET $1 LIMIT $2"
    ))
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_listing(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ResultListing>, sqlx::Error> {
    sqlx::query_as::<_, ResultListing>(&format!("{LISTING_SELECT} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn count(pool: &PgPool, include_disabled: bool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM results WHERE $1 OR NOT disabled")
        .bind(include_disabled)
        .fetch_one(pool)
        .await
}
