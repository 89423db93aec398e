use std::collections::HashSet;

use axum::http::{Method, StatusCode};
use serde_json::json;
use time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Topic;
use crate::repositories;
use crate::test_support;

struct QuestionSeed<'a> {
    text: &'a str,
    options: &'a [&'a str],
    correct: &'a str,
    topic: Option<&'a Topic>,
}

async fn build_exam(
    state: &AppState,
    duration_minutes: i32,
    seeds: &[QuestionSeed<'_>],
) -> (String, Vec<String>) {
    let set = test_support::insert_question_set(state.db(), "Delivery set").await;

    let mut question_ids = Vec::new();
    for seed in seeds {
        let question = test_support::insert_question(
            state.db(),
            &set,
            seed.topic,
            seed.text,
            seed.options,
            seed.correct,
        )
        .await;
        question_ids.push(question.id);
    }

    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            title: "Delivery exam",
            duration_minutes,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .expect("create exam");

    repositories::exams::insert_exam_questions(state.db(), &exam.id, &question_ids)
        .await
        .expect("link questions");

    (exam.id, question_ids)
}

async fn start_attempt(
    ctx: &test_support::TestContext,
    exam_id: &str,
    name: &str,
    email: &str,
) -> serde_json::Value {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/attempts"),
            None,
            Some(json!({"name": name, "email": email})),
        ))
        .await
        .expect("start attempt");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    body
}

async fn save_answer(
    ctx: &test_support::TestContext,
    attempt_id: &str,
    question_id: &str,
    selected_option: &str,
) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/attempts/{attempt_id}/answers"),
            None,
            Some(json!({"question_id": question_id, "selected_option": selected_option})),
        ))
        .await
        .expect("save answer");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
}

async fn submit(ctx: &test_support::TestContext, attempt_id: &str) -> serde_json::Value {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/attempts/{attempt_id}/submit"),
            None,
            None,
        ))
        .await
        .expect("submit attempt");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    body
}

#[tokio::test]
async fn paper_withholds_answers_and_keeps_the_id_set_stable() {
    let ctx = test_support::setup_test_context().await;

    let seeds = [
        QuestionSeed { text: "Q1", options: &["a", "b"], correct: "a", topic: None },
        QuestionSeed { text: "Q2", options: &["c", "d"], correct: "d", topic: None },
        QuestionSeed { text: "Q3", options: &["e", "f"], correct: "e", topic: None },
    ];
    let (exam_id, question_ids) = build_exam(&ctx.state, 10, &seeds).await;

    let mut id_sets = Vec::new();
    for _ in 0..2 {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/exams/{exam_id}/paper"),
                None,
                None,
            ))
            .await
            .expect("paper");

        let paper = test_support::read_json(response).await;
        assert_eq!(paper["exam"]["question_count"], 3);

        for question in paper["questions"].as_array().unwrap() {
            assert!(question.get("correct_option").is_none(), "answer key leaked: {question}");
            assert_eq!(question["options"].as_array().unwrap().len(), 2);
        }

        let ids: HashSet<String> = paper["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|question| question["id"].as_str().unwrap().to_string())
            .collect();
        id_sets.push(ids);
    }

    let expected: HashSet<String> = question_ids.into_iter().collect();
    assert_eq!(id_sets[0], expected);
    assert_eq!(id_sets[1], expected);
}

#[tokio::test]
async fn full_flow_grades_overwrites_and_reports_by_topic() {
    let ctx = test_support::setup_test_context().await;

    let chapter = test_support::insert_chapter(ctx.state.db(), "Algebra").await;
    let topic = test_support::insert_topic(
        ctx.state.db(),
        &chapter,
        "Linear equations",
        Some("https://youtube.com/watch?v=linear"),
    )
    .await;

    let seeds = [
        QuestionSeed { text: "2+2?", options: &["3", "4"], correct: "4", topic: Some(&topic) },
        QuestionSeed { text: "x+1=2?", options: &["0", "1"], correct: "1", topic: Some(&topic) },
    ];
    let (exam_id, question_ids) = build_exam(&ctx.state, 1, &seeds).await;

    let attempt = start_attempt(&ctx, &exam_id, "Ada", "ada@example.com").await;
    let attempt_id = attempt["id"].as_str().expect("attempt id").to_string();
    assert_eq!(attempt["status"], "in_progress");
    assert!(attempt["time_remaining"].as_i64().unwrap() <= 60);

    // First question answered correctly; the second gets a wrong pick that
    // overwrites an earlier right one (single-select, last write wins).
    save_answer(&ctx, &attempt_id, &question_ids[0], "4").await;
    save_answer(&ctx, &attempt_id, &question_ids[1], "1").await;
    save_answer(&ctx, &attempt_id, &question_ids[1], "0").await;

    let submitted = submit(&ctx, &attempt_id).await;
    assert_eq!(submitted["score"], 50);
    let time_taken = submitted["time_taken_seconds"].as_i64().expect("time taken");
    assert!((0..=60).contains(&time_taken));
    assert!(submitted["submitted_at"].is_string());

    let answers =
        repositories::attempts::list_answers(ctx.state.db(), &attempt_id).await.expect("answers");
    assert_eq!(answers.len(), 2);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/results/{attempt_id}"),
            None,
            None,
        ))
        .await
        .expect("results");
    let status = response.status();
    let results = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {results}");

    assert_eq!(results["exam_title"], "Delivery exam");
    assert_eq!(results["student_name"], "Ada");
    assert_eq!(results["score"], 50);
    assert_eq!(results["mistake_count"], 1);

    let groups = results["mistaken_topics"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["topic_name"], "Linear equations");
    assert_eq!(groups[0]["youtube_link"], "https://youtube.com/watch?v=linear");
    let mistakes = groups[0]["questions"].as_array().unwrap();
    assert_eq!(mistakes.len(), 1);
    assert_eq!(mistakes[0]["selected_option"], "0");
    assert_eq!(mistakes[0]["correct_option"], "1");
}

#[tokio::test]
async fn perfect_attempt_reports_no_mistaken_topics() {
    let ctx = test_support::setup_test_context().await;

    let seeds = [
        QuestionSeed { text: "Q1", options: &["a", "b"], correct: "a", topic: None },
        QuestionSeed { text: "Q2", options: &["c", "d"], correct: "d", topic: None },
    ];
    let (exam_id, question_ids) = build_exam(&ctx.state, 1, &seeds).await;

    let attempt = start_attempt(&ctx, &exam_id, "Grace", "grace@example.com").await;
    let attempt_id = attempt["id"].as_str().expect("attempt id").to_string();

    save_answer(&ctx, &attempt_id, &question_ids[0], "a").await;
    save_answer(&ctx, &attempt_id, &question_ids[1], "d").await;

    let submitted = submit(&ctx, &attempt_id).await;
    assert_eq!(submitted["score"], 100);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/results/{attempt_id}"),
            None,
            None,
        ))
        .await
        .expect("results");
    let results = test_support::read_json(response).await;
    assert_eq!(results["mistake_count"], 0);
    assert!(results["mistaken_topics"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn submitting_twice_neither_duplicates_rows_nor_changes_the_score() {
    let ctx = test_support::setup_test_context().await;

    let seeds = [
        QuestionSeed { text: "Q1", options: &["a", "b"], correct: "a", topic: None },
        QuestionSeed { text: "Q2", options: &["c", "d"], correct: "d", topic: None },
    ];
    let (exam_id, question_ids) = build_exam(&ctx.state, 1, &seeds).await;

    let attempt = start_attempt(&ctx, &exam_id, "Ada", "ada@example.com").await;
    let attempt_id = attempt["id"].as_str().expect("attempt id").to_string();
    save_answer(&ctx, &attempt_id, &question_ids[0], "a").await;

    let first = submit(&ctx, &attempt_id).await;
    assert_eq!(first["score"], 50);
    let first_submitted_at = first["submitted_at"].as_str().expect("submitted_at").to_string();

    let second = submit(&ctx, &attempt_id).await;
    assert_eq!(second["score"], 50);
    assert_eq!(second["submitted_at"], first_submitted_at.as_str());

    let answers =
        repositories::attempts::list_answers(ctx.state.db(), &attempt_id).await.expect("answers");
    assert_eq!(answers.len(), 2);
}

#[tokio::test]
async fn reregistering_the_same_email_reuses_the_student() {
    let ctx = test_support::setup_test_context().await;

    let seeds = [QuestionSeed { text: "Q1", options: &["a", "b"], correct: "a", topic: None }];
    let (exam_id, _) = build_exam(&ctx.state, 5, &seeds).await;

    start_attempt(&ctx, &exam_id, "Ada Lovelace", "ada@example.com").await;
    start_attempt(&ctx, &exam_id, "Ada L.", "ada@example.com").await;

    assert_eq!(repositories::students::count(ctx.state.db()).await.expect("count"), 1);
    let student = repositories::students::find_by_email(ctx.state.db(), "ada@example.com")
        .await
        .expect("find student")
        .expect("student exists");
    assert_eq!(student.name, "Ada L.");
}

#[tokio::test]
async fn start_rejects_missing_name_and_implausible_email() {
    let ctx = test_support::setup_test_context().await;

    let seeds = [QuestionSeed { text: "Q1", options: &["a", "b"], correct: "a", topic: None }];
    let (exam_id, _) = build_exam(&ctx.state, 5, &seeds).await;

    for payload in [
        json!({"name": "", "email": "ada@example.com"}),
        json!({"name": "Ada", "email": "not-an-email"}),
        json!({"name": "Ada", "email": "a@b"}),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/{exam_id}/attempts"),
                None,
                Some(payload),
            ))
            .await
            .expect("start attempt");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams/missing/attempts",
            None,
            Some(json!({"name": "Ada", "email": "ada@example.com"})),
        ))
        .await
        .expect("start attempt");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn answer_saving_validates_question_state_and_clamps_the_index() {
    let ctx = test_support::setup_test_context().await;

    let seeds = [
        QuestionSeed { text: "Q1", options: &["a", "b"], correct: "a", topic: None },
        QuestionSeed { text: "Q2", options: &["c", "d"], correct: "d", topic: None },
    ];
    let (exam_id, question_ids) = build_exam(&ctx.state, 5, &seeds).await;

    let attempt = start_attempt(&ctx, &exam_id, "Ada", "ada@example.com").await;
    let attempt_id = attempt["id"].as_str().expect("attempt id").to_string();

    // Unknown question id.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/attempts/{attempt_id}/answers"),
            None,
            Some(json!({"question_id": "not-in-exam", "selected_option": "a"})),
        ))
        .await
        .expect("save answer");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Bookmark clamps into [0, count-1].
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/attempts/{attempt_id}/answers"),
            None,
            Some(json!({
                "question_id": question_ids[0],
                "selected_option": "a",
                "current_question_index": 99,
            })),
        ))
        .await
        .expect("save answer");
    let body = test_support::read_json(response).await;
    assert_eq!(body["current_question_index"], 1);

    submit(&ctx, &attempt_id).await;

    // Writes after submission are refused.
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/attempts/{attempt_id}/answers"),
            None,
            Some(json!({"question_id": question_ids[1], "selected_option": "d"})),
        ))
        .await
        .expect("save answer");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overdue_attempts_are_finalized_on_read_with_the_full_duration_charged() {
    let ctx = test_support::setup_test_context().await;

    let seeds = [
        QuestionSeed { text: "Q1", options: &["a", "b"], correct: "a", topic: None },
        QuestionSeed { text: "Q2", options: &["c", "d"], correct: "d", topic: None },
    ];
    let (exam_id, _) = build_exam(&ctx.state, 1, &seeds).await;

    let student = repositories::students::upsert_by_email(
        ctx.state.db(),
        &Uuid::new_v4().to_string(),
        "Late Larry",
        "larry@example.com",
        primitive_now_utc(),
    )
    .await
    .expect("student");

    let now = primitive_now_utc();
    let attempt = repositories::attempts::create(
        ctx.state.db(),
        repositories::attempts::CreateAttempt {
            id: &Uuid::new_v4().to_string(),
            student_id: &student.id,
            exam_id: &exam_id,
            started_at: now - Duration::minutes(2),
            expires_at: now - Duration::minutes(1),
        },
    )
    .await
    .expect("attempt");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/attempts/{}", attempt.id),
            None,
            None,
        ))
        .await
        .expect("get attempt");

    let state = test_support::read_json(response).await;
    assert_eq!(state["status"], "submitted");
    assert_eq!(state["score"], 0);
    assert_eq!(state["time_taken_seconds"], 60);
    assert_eq!(state["time_remaining"], 0);

    let answers = repositories::attempts::list_answers(ctx.state.db(), &attempt.id)
        .await
        .expect("answers");
    assert_eq!(answers.len(), 2);
    assert!(answers.iter().all(|answer| answer.selected_option.is_empty()));
    assert!(answers.iter().all(|answer| !answer.is_correct));
}

#[tokio::test]
async fn expiry_sweep_finalizes_overdue_attempts_once() {
    let ctx = test_support::setup_test_context().await;

    let seeds = [QuestionSeed { text: "Q1", options: &["a", "b"], correct: "a", topic: None }];
    let (exam_id, _) = build_exam(&ctx.state, 1, &seeds).await;

    let student = repositories::students::upsert_by_email(
        ctx.state.db(),
        &Uuid::new_v4().to_string(),
        "Sweeper",
        "sweeper@example.com",
        primitive_now_utc(),
    )
    .await
    .expect("student");

    let now = primitive_now_utc();
    repositories::attempts::create(
        ctx.state.db(),
        repositories::attempts::CreateAttempt {
            id: &Uuid::new_v4().to_string(),
            student_id: &student.id,
            exam_id: &exam_id,
            started_at: now - Duration::minutes(5),
            expires_at: now - Duration::minutes(4),
        },
    )
    .await
    .expect("attempt");

    let closed = crate::tasks::expiry::sweep_once(&ctx.state).await.expect("sweep");
    assert_eq!(closed, 1);

    let closed_again = crate::tasks::expiry::sweep_once(&ctx.state).await.expect("sweep");
    assert_eq!(closed_again, 0);
}

#[tokio::test]
async fn results_handle_missing_and_unsubmitted_attempts() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/results/missing", None, None))
        .await
        .expect("results");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let seeds = [QuestionSeed { text: "Q1", options: &["a", "b"], correct: "a", topic: None }];
    let (exam_id, _) = build_exam(&ctx.state, 5, &seeds).await;
    let attempt = start_attempt(&ctx, &exam_id, "Ada", "ada@example.com").await;
    let attempt_id = attempt["id"].as_str().expect("attempt id");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/results/{attempt_id}"),
            None,
            None,
        ))
        .await
        .expect("results");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
