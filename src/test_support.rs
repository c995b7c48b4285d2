use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use sqlx::PgPool;
use time::macros::datetime;
use time::PrimitiveDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::api;
use crate::core::{config::Settings, security, state::AppState, time::primitive_now_utc};
use crate::db::models::{ExamResult, User};
use crate::db::types::ResultStatus;
use crate::repositories;
use crate::services::notifications::ResultNotifier;

const TEST_SECRET_KEY: &str = "test-secret";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

fn test_database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("PORTAL_TEST_DATABASE_URL").ok().filter(|url| !url.trim().is_empty())
}

pub(crate) fn set_test_env(database_url: &str) {
    std::env::set_var("PORTAL_ENV", "test");
    std::env::set_var("PORTAL_STRICT_CONFIG", "0");
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var("DATABASE_URL", database_url);
    std::env::set_var("DB_MAX_CONNECTIONS", "5");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("EXAM_DEFAULT_MINUTES_TO_FINISH");
    std::env::remove_var("EXAM_FORM_TOKEN_FIELD");
    std::env::remove_var("NOTIFY_WEBHOOK_URL");
    std::env::remove_var("FIRST_SUPERUSER_PASSWORD");
}

/// Builds an app against the test database, or `None` when
/// `PORTAL_TEST_DATABASE_URL` is not set.
pub(crate) async fn setup_test_context() -> Option<TestContext> {
    let guard = env_lock().await;
    let Some(database_url) = test_database_url() else {
        eprintln!("PORTAL_TEST_DATABASE_URL not set; skipping database test");
        return None;
    };
    set_test_env(&database_url);

    let settings = Settings::load().expect("settings");
    let db = prepare_db(&settings).await;
    let notifier = ResultNotifier::from_settings(&settings).expect("notifier");

    let state = AppState::new(settings, db, notifier);
    let app = api::router::router(state.clone());

    Some(TestContext { state, app, _guard: guard })
}

async fn prepare_db(settings: &Settings) -> PgPool {
    let db = crate::db::init_pool(settings).await.expect("db pool");

    reset_public_schema(&db).await.expect("reset schema");
    ensure_schema(&db).await.expect("schema");
    reset_db(&db).await.expect("reset db");
    db
}

async fn reset_public_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("DROP SCHEMA IF EXISTS public CASCADE").execute(pool).await?;
    sqlx::query("CREATE SCHEMA public").execute(pool).await?;
    Ok(())
}

pub(crate) async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let migrations_dir =
        std::env::var("PORTAL_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir))
        .await
        .map_err(|error| sqlx::Error::Migrate(Box::new(error)))?;
    migrator.run(pool).await.map_err(|error| sqlx::Error::Migrate(Box::new(error)))?;
    Ok(())
}

pub(crate) async fn reset_db(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "TRUNCATE responses, results, exam_settings, answers, questions, sections, extras, \
         subjects, exams, users RESTART IDENTITY CASCADE",
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn insert_user(
    pool: &PgPool,
    username: &str,
    full_name: &str,
    password: &str,
) -> User {
    insert_user_with_staff(pool, username, full_name, password, false).await
}

pub(crate) async fn insert_staff(
    pool: &PgPool,
    username: &str,
    full_name: &str,
    password: &str,
) -> User {
    insert_user_with_staff(pool, username, full_name, password, true).await
}

pub(crate) async fn insert_user_with_staff(
    pool: &PgPool,
    username: &str,
    full_name: &str,
    password: &str,
    is_staff: bool,
) -> User {
    let hashed_password = security::hash_password(password).expect("hash password");
    let now = primitive_now_utc();

    repositories::users::create(
        pool,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            hashed_password,
            full_name,
            email: Some("candidate@example.com"),
            is_staff,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("insert user")
}

/// An unsaved result started 2025-03-01 09:00 with an 11:00 deadline.
pub(crate) fn exam_result(status: ResultStatus) -> ExamResult {
    let start = datetime!(2025-03-01 09:00:00);
    ExamResult {
        id: 1,
        user_id: "candidate".into(),
        status,
        start_time: start,
        end_time: None,
        deadline: datetime!(2025-03-01 11:00:00),
        disabled: false,
        created_at: start,
        updated_at: start,
    }
}

/// Ids of the two-question "Math101" exam used across the exam tests.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SeededExam {
    pub(crate) exam_id: i64,
    pub(crate) subject_id: i64,
    pub(crate) section_id: i64,
    pub(crate) q1: i64,
    pub(crate) q2: i64,
    /// Q1: wrong
    pub(crate) a1: i64,
    /// Q1: correct
    pub(crate) a2: i64,
    /// Q2: correct
    pub(crate) a3: i64,
    /// Q2: wrong
    pub(crate) a4: i64,
}

pub(crate) async fn seed_math_exam(pool: &PgPool) -> SeededExam {
    let now = primitive_now_utc();
    let exam = repositories::catalog::insert_exam(pool, "Math101", "", now)
        .await
        .expect("insert exam");
    let subject_id = repositories::catalog::insert_subject(pool, exam.id, "Algebra", now)
        .await
        .expect("insert subject");
    let section_id =
        repositories::catalog::insert_section(pool, subject_id, "Basics", "", None, now)
            .await
            .expect("insert section");

    let q1 = repositories::catalog::insert_question(pool, section_id, "Q1", None, now)
        .await
        .expect("insert q1");
    let a1 = insert_answer(pool, q1, "A1", false, now).await;
    let a2 = insert_answer(pool, q1, "A2", true, now).await;

    let q2 = repositories::catalog::insert_question(pool, section_id, "Q2", None, now)
        .await
        .expect("insert q2");
    let a3 = insert_answer(pool, q2, "A3", true, now).await;
    let a4 = insert_answer(pool, q2, "A4", false, now).await;

    SeededExam { exam_id: exam.id, subject_id, section_id, q1, q2, a1, a2, a3, a4 }
}

async fn insert_answer(
    pool: &PgPool,
    question_id: i64,
    text: &str,
    is_correct: bool,
    now: PrimitiveDateTime,
) -> i64 {
    repositories::catalog::insert_answer(pool, question_id, text, None, is_correct, now)
        .await
        .expect("insert answer")
}

pub(crate) fn bearer_token(user_id: &str, settings: &Settings) -> String {
    security::create_access_token(user_id, settings, None).expect("token")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

/// A urlencoded POST, the way the answer sheet is submitted.
pub(crate) fn form_request(uri: &str, token: &str, fields: &[(&str, String)]) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("request body")
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
