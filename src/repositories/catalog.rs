use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Answer, Exam, Extra, Question, QuestionPlacement, Section, Subject};

const EXAM_COLUMNS: &str = "id, title, description, disabled, created_at, updated_at";

pub(crate) async fn find_active_exam(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1 AND NOT disabled"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_exam_any(pool: &PgPool, id: i64) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Most recently created active exam.
pub(crate) async fn latest_active_exam_id(
    executor: impl sqlx::PgExecutor<'_>,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT id FROM exams WHERE NOT disabled ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_active_exams(pool: &PgPool) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {EXAM_COLUMNS} FROM exams WHERE NOT disabled ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_all_exams(pool: &PgPool) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {EXAM_COLUMNS} FROM exams ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn disable_exam(
    pool: &PgPool,
    id: i64,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE exams SET disabled = TRUE, updated_at = $1 WHERE id = $2")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn insert_exam(
    executor: impl sqlx::PgExecutor<'_>,
    title: &str,
    description: &str,
    now: PrimitiveDateTime,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (title, description, created_at, updated_at)
         VALUES ($1, $2, $3, $3)
         RETURNING {EXAM_COLUMNS}"
    ))
    .bind(title)
    .bind(description)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn insert_extra(
    executor: impl sqlx::PgExecutor<'_>,
    title: &str,
    text: &str,
    image_path: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO extras (title, text, image_path, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $4)
         RETURNING id",
    )
    .bind(title)
    .bind(text)
    .bind(image_path)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn insert_subject(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
    title: &str,
    now: PrimitiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO subjects (exam_id, title, created_at, updated_at)
         VALUES ($1, $2, $3, $3)
         RETURNING id",
    )
    .bind(exam_id)
    .bind(title)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn insert_section(
    executor: impl sqlx::PgExecutor<'_>,
    subject_id: i64,
    title: &str,
    instructions: &str,
    extra_id: Option<i64>,
    now: PrimitiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO sections (subject_id, title, instructions, extra_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $5)
         RETURNING id",
    )
    .bind(subject_id)
    .bind(title)
    .bind(instructions)
    .bind(extra_id)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn insert_question(
    executor: impl sqlx::PgExecutor<'_>,
    section_id: i64,
    text: &str,
    image_path: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO questions (section_id, text, image_path, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $4)
         RETURNING id",
    )
    .bind(section_id)
    .bind(text)
    .bind(image_path)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn insert_answer(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: i64,
    text: &str,
    image_path: Option<&str>,
    is_correct: bool,
    now: PrimitiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO answers (question_id, text, image_path, is_correct, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $5)
         RETURNING id",
    )
    .bind(question_id)
    .bind(text)
    .bind(image_path)
    .bind(is_correct)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_subjects(
    pool: &PgPool,
    exam_id: i64,
) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(
        "SELECT id, exam_id, title, created_at
         FROM subjects
         WHERE exam_id = $1 AND NOT disabled
         ORDER BY exam_id, title, created_at, id",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_sections(
    pool: &PgPool,
    exam_id: i64,
) -> Result<Vec<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>(
        "SELECT se.id, se.subject_id, se.title, se.instructions, se.extra_id
         FROM sections se
         JOIN subjects su ON su.id = se.subject_id
         WHERE su.exam_id = $1 AND NOT su.disabled AND NOT se.disabled
         ORDER BY se.subject_id, se.id",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_extras(pool: &PgPool, exam_id: i64) -> Result<Vec<Extra>, sqlx::Error> {
    sqlx::query_as::<_, Extra>(
        "SELECT DISTINCT ex.id, ex.title, ex.text, ex.image_path
         FROM extras ex
         JOIN sections se ON se.extra_id = ex.id
         JOIN subjects su ON su.id = se.subject_id
         WHERE su.exam_id = $1 AND NOT ex.disabled AND NOT se.disabled AND NOT su.disabled
         ORDER BY ex.id",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_questions(
    pool: &PgPool,
    exam_id: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT q.id, q.section_id, q.text, q.image_path
         FROM questions q
         JOIN sections se ON se.id = q.section_id
         JOIN subjects su ON su.id = se.subject_id
         WHERE su.exam_id = $1 AND NOT q.disabled AND NOT se.disabled AND NOT su.disabled
         ORDER BY q.section_id, q.id",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_answers(pool: &PgPool, exam_id: i64) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(
        "SELECT a.id, a.question_id, a.text, a.image_path, a.is_correct
         FROM answers a
         JOIN questions q ON q.id = a.question_id
         JOIN sections se ON se.id = q.section_id
         JOIN subjects su ON su.id = se.subject_id
         WHERE su.exam_id = $1
           AND NOT a.disabled AND NOT q.disabled AND NOT se.disabled AND NOT su.disabled
         ORDER BY a.question_id, a.id",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

/// Resolves submitted answer ids; disabled answers are treated as absent.
pub(crate) async fn find_active_answers(
    executor: impl sqlx::PgExecutor<'_>,
    ids: &[i64],
) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(
        "SELECT id, question_id, text, image_path, is_correct
         FROM answers
         WHERE id = ANY($1) AND NOT disabled",
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_question_placements(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
) -> Result<Vec<QuestionPlacement>, sqlx::Error> {
    sqlx::query_as::<_, QuestionPlacement>(
        "SELECT q.id AS question_id, q.section_id, se.subject_id
         FROM questions q
         JOIN sections se ON se.id = q.section_id
         JOIN subjects su ON su.id = se.subject_id
         WHERE su.exam_id = $1 AND NOT q.disabled AND NOT se.disabled AND NOT su.disabled
         ORDER BY q.id",
    )
    .bind(exam_id)
    .fetch_all(executor)
    .await
}
