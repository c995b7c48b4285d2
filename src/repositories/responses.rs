use sqlx::{Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::ScoredResponse;

/// Inserts one response row per answer id in a single statement.
pub(crate) async fn insert_batch(
    executor: impl sqlx::PgExecutor<'_>,
    result_id: i64,
    answer_ids: &[i64],
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    if answer_ids.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO responses (result_id, answer_id, created_at, updated_at) ");
    builder.push_values(answer_ids, |mut row, answer_id| {
        row.push_bind(result_id).push_bind(*answer_id).push_bind(now).push_bind(now);
    });

    let result = builder.build().execute(executor).await?;
    Ok(result.rows_affected())
}

pub(crate) async fn list_scored(
    executor: impl sqlx::PgExecutor<'_>,
    result_id: i64,
) -> Result<Vec<ScoredResponse>, sqlx::Error> {
    sqlx::query_as::<_, ScoredResponse>(
        "SELECT r.id AS response_id, a.id AS answer_id, a.is_correct,
                q.id AS question_id, se.id AS section_id, su.id AS subject_id, su.exam_id
         FROM responses r
         JOIN answers a ON a.id = r.answer_id
         JOIN questions q ON q.id = a.question_id
         JOIN sections se ON se.id = q.section_id
         JOIN subjects su ON su.id = se.subject_id
         WHERE r.result_id = $1
         ORDER BY r.id",
    )
    .bind(result_id)
    .fetch_all(executor)
    .await
}
