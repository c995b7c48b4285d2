use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support::{self, TestContext};

async fn staff_token(ctx: &TestContext) -> String {
    let admin =
        test_support::insert_staff(ctx.state.db(), "backoffice", "Back Office", "staff-pass").await;
    test_support::bearer_token(&admin.id, ctx.state.settings())
}

async fn candidate_token(ctx: &TestContext, username: &str) -> String {
    let user =
        test_support::insert_user(ctx.state.db(), username, "Exam Candidate", "candidate-pass")
            .await;
    test_support::bearer_token(&user.id, ctx.state.settings())
}

async fn call(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, Some(token), body))
        .await
        .expect("response");
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, serde_json::Value::Null);
    }
    (status, test_support::read_json(response).await)
}

fn exam_tree(second_correct: bool) -> serde_json::Value {
    json!({
        "title": "Physics",
        "description": "Mechanics placement",
        "subjects": [{
            "title": "Mechanics",
            "sections": [{
                "title": "Kinematics",
                "instructions": "Pick one answer per question",
                "extra": {"title": "Formula sheet", "text": "v = u + at"},
                "questions": [{
                    "text": "Unit of acceleration?",
                    "answers": [
                        {"text": "m/s^2", "is_correct": true},
                        {"text": "m/s", "is_correct": second_correct}
                    ]
                }]
            }]
        }]
    })
}

#[tokio::test]
async fn candidates_cannot_use_back_office() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let token = candidate_token(&ctx, "candidate1").await;

    let (status, body) = call(&ctx, Method::GET, "/api/v1/admin/settings", &token, None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], 403);
}

#[tokio::test]
async fn settings_upsert_drives_new_deadlines() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let exam = test_support::seed_math_exam(ctx.state.db()).await;
    let admin = staff_token(&ctx).await;

    let (status, body) = call(&ctx, Method::GET, "/api/v1/admin/settings", &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "default");
    assert_eq!(body["current_exam_id"], exam.exam_id);

    let (status, _) = call(
        &ctx,
        Method::PUT,
        "/api/v1/admin/settings",
        &admin,
        Some(json!({"current_exam_id": 999_999, "minutes_to_finish": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &ctx,
        Method::PUT,
        "/api/v1/admin/settings",
        &admin,
        Some(json!({"current_exam_id": exam.exam_id, "minutes_to_finish": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for minutes in [45, 30] {
        let (status, body) = call(
            &ctx,
            Method::PUT,
            "/api/v1/admin/settings",
            &admin,
            Some(json!({"current_exam_id": exam.exam_id, "minutesToFinish": minutes})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "configured");
        assert_eq!(body["minutes_to_finish"], minutes);
    }
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exam_settings")
        .fetch_one(ctx.state.db())
        .await
        .expect("count");
    assert_eq!(rows, 1);

    let candidate = candidate_token(&ctx, "candidate1").await;
    let (status, _) = call(&ctx, Method::POST, "/api/v1/exam", &candidate, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let seconds: i64 = sqlx::query_scalar(
        "SELECT EXTRACT(EPOCH FROM deadline - start_time)::BIGINT FROM results",
    )
    .fetch_one(ctx.state.db())
    .await
    .expect("deadline");
    assert_eq!(seconds, 30 * 60);
}

#[tokio::test]
async fn exam_tree_creation_validates_answer_key() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let admin = staff_token(&ctx).await;

    let (status, body) =
        call(&ctx, Method::POST, "/api/v1/admin/exams", &admin, Some(exam_tree(true))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().expect("detail").contains("exactly one correct answer"));

    let (status, created) =
        call(&ctx, Method::POST, "/api/v1/admin/exams", &admin, Some(exam_tree(false))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Physics");
    let exam_id = created["id"].as_i64().expect("exam id");

    let (status, paper) =
        call(&ctx, Method::GET, &format!("/api/v1/admin/exams/{exam_id}"), &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    let section = &paper["subjects"][0]["sections"][0];
    assert_eq!(section["extra"]["title"], "Formula sheet");
    assert_eq!(section["questions"][0]["answers"][0]["is_correct"], true);
    assert_eq!(section["questions"][0]["answers"][1]["is_correct"], false);

    let exams: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exams")
        .fetch_one(ctx.state.db())
        .await
        .expect("count");
    assert_eq!(exams, 1);
}

#[tokio::test]
async fn disabled_exams_are_hidden_by_default() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let exam = test_support::seed_math_exam(ctx.state.db()).await;
    let admin = staff_token(&ctx).await;

    let (status, _) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/admin/exams/{}/disable", exam.exam_id),
        &admin,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, active) = call(&ctx, Method::GET, "/api/v1/admin/exams", &admin, None).await;
    assert_eq!(active, json!([]));

    let (_, all) =
        call(&ctx, Method::GET, "/api/v1/admin/exams?include_disabled=true", &admin, None).await;
    assert_eq!(all[0]["id"], exam.exam_id);
    assert_eq!(all[0]["disabled"], true);

    let (status, settings) =
        call(&ctx, Method::GET, "/api/v1/admin/settings", &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(settings["current_exam_id"].is_null());

    let (status, _) =
        call(&ctx, Method::POST, "/api/v1/admin/exams/999999/disable", &admin, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn result_report_shows_scores_and_breakdown() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let exam = test_support::seed_math_exam(ctx.state.db()).await;
    let admin = staff_token(&ctx).await;
    let candidate = candidate_token(&ctx, "candidate1").await;

    call(&ctx, Method::POST, "/api/v1/exam", &candidate, None).await;
    let fields =
        [(exam.q1.to_string(), exam.a2.to_string()), (exam.q2.to_string(), exam.a4.to_string())];
    let fields: Vec<(&str, String)> = fields.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::form_request("/api/v1/exam/answering", &candidate, &fields))
        .await
        .expect("submit");
    assert_eq!(response.status(), StatusCode::OK);

    let (status, list) = call(&ctx, Method::GET, "/api/v1/admin/results", &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total_count"], 1);
    let row = &list["items"][0];
    assert_eq!(row["username"], "candidate1");
    assert_eq!(row["status"], "finished");
    assert_eq!(row["score"], 1);
    assert_eq!(row["total"], 2);
    assert!(row["elapsed_seconds"].is_i64());

    let result_id = row["id"].as_i64().expect("result id");
    let (status, detail) =
        call(&ctx, Method::GET, &format!("/api/v1/admin/results/{result_id}"), &admin, None)
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["subjects"][0]["title"], "Algebra");
    assert_eq!(detail["subjects"][0]["correct"], 1);
    assert_eq!(detail["subjects"][0]["sections"][0]["title"], "Basics");
    assert_eq!(detail["subjects"][0]["sections"][0]["total"], 2);

    let (status, _) =
        call(&ctx, Method::GET, "/api/v1/admin/results/999999", &admin, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn disabling_a_result_grants_a_retake() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    test_support::seed_math_exam(ctx.state.db()).await;
    let admin = staff_token(&ctx).await;
    let candidate = candidate_token(&ctx, "candidate1").await;

    let (_, first) = call(&ctx, Method::POST, "/api/v1/exam", &candidate, None).await;
    let first_id = first["result"]["id"].as_i64().expect("result id");

    let (status, disabled) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/admin/results/{first_id}/disable"),
        &admin,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(disabled["disabled"], true);

    let (_, home) = call(&ctx, Method::GET, "/api/v1/exam", &candidate, None).await;
    assert_eq!(home["route"], "intro");

    let (status, second) = call(&ctx, Method::POST, "/api/v1/exam", &candidate, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["created"], true);
    assert_ne!(second["result"]["id"], first["result"]["id"]);

    let (_, active) = call(&ctx, Method::GET, "/api/v1/admin/results", &admin, None).await;
    assert_eq!(active["total_count"], 1);
    let (_, all) =
        call(&ctx, Method::GET, "/api/v1/admin/results?include_disabled=true", &admin, None)
            .await;
    assert_eq!(all["total_count"], 2);
}

#[tokio::test]
async fn staff_can_create_candidates_who_can_log_in() {
    let Some(ctx) = test_support::setup_test_context().await else { return };
    let admin = staff_token(&ctx).await;
    let payload = json!({
        "username": "newcandidate",
        "full_name": "New Candidate",
        "email": "new@example.com",
        "password": "candidate-pass"
    });

    let (status, created) =
        call(&ctx, Method::POST, "/api/v1/admin/candidates", &admin, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["username"], "newcandidate");
    assert_eq!(created["is_staff"], false);

    let (status, _) =
        call(&ctx, Method::POST, "/api/v1/admin/candidates", &admin, Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "newcandidate", "password": "candidate-pass"})),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);
    let login = test_support::read_json(response).await;
    let token = login["access_token"].as_str().expect("token").to_string();

    let (status, me) = call(&ctx, Method::GET, "/api/v1/auth/me", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["full_name"], "New Candidate");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "newcandidate", "password": "wrong-pass"})),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
