use time::PrimitiveDateTime;

use crate::db::models::ExamConfiguration;

const COLUMNS: &str = "current_exam_id, minutes_to_finish, updated_at";

pub(crate) async fn find(
    executor: impl sqlx::PgExecutor<'_>,
) -> Result<Option<ExamConfiguration>, sqlx::Error> {
    sqlx::query_as::<_, ExamConfiguration>(&format!(
        "SELECT {COLUMNS} FROM exam_settings WHERE id = 1"
    ))
    .fetch_optional(executor)
    .await
}

/// Replaces the configuration row; the table only ever holds `id = 1`.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    current_exam_id: i64,
    minutes_to_finish: i32,
    now: PrimitiveDateTime,
) -> Result<ExamConfiguration, sqlx::Error> {
    sqlx::query_as::<_, ExamConfiguration>(&format!(
        "INSERT INTO exam_settings (id, current_exam_id, minutes_to_finish, created_at, updated_at)
         VALUES (1, $1, $2, $3, $3)
         ON CONFLICT (id) DO UPDATE SET
            current_exam_id = EXCLUDED.current_exam_id,
            minutes_to_finish = EXCLUDED.minutes_to_finish,
            updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(current_exam_id)
    .bind(minutes_to_finish)
    .bind(now)
    .fetch_one(executor)
    .await
}
