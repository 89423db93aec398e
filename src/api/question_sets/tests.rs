use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
async fn set_authoring_flow_with_inline_chapter_and_topic() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "teacher@example.com", "pass-word").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/question-sets",
            Some(&token),
            Some(json!({"name": "Thermodynamics"})),
        ))
        .await
        .expect("create set");
    let status = response.status();
    let set = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {set}");
    let set_id = set["id"].as_str().expect("set id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/question-sets/{set_id}/questions"),
            Some(&token),
            Some(json!({
                "question_text": "What is the first law about?",
                "options": [
                    {"value": "Energy conservation", "is_correct": true},
                    {"value": "Entropy"},
                ],
                "new_chapter_name": "Laws",
                "new_topic_name": "First law",
                "new_topic_youtube_link": "https://youtube.com/watch?v=first-law",
            })),
        ))
        .await
        .expect("create question");
    let status = response.status();
    let question = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {question}");
    assert_eq!(question["correct_option"], "Energy conservation");
    let chapter_id = question["chapter_id"].as_str().expect("chapter id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/chapters", Some(&token), None))
        .await
        .expect("list chapters");
    let chapters = test_support::read_json(response).await;
    assert!(chapters.as_array().unwrap().iter().any(|c| c["name"] == "Laws"));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/chapters/{chapter_id}/topics"),
            Some(&token),
            None,
        ))
        .await
        .expect("list topics");
    let topics = test_support::read_json(response).await;
    let topic = &topics.as_array().unwrap()[0];
    assert_eq!(topic["name"], "First law");
    assert_eq!(topic["youtube_link"], "https://youtube.com/watch?v=first-law");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/question-sets/{set_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("set detail");
    let detail = test_support::read_json(response).await;
    assert_eq!(detail["questions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn question_must_mark_exactly_one_correct_option() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "teacher@example.com", "pass-word").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let set = test_support::insert_question_set(ctx.state.db(), "Thermodynamics").await;

    for options in [
        json!([{"value": "a"}, {"value": "b"}]),
        json!([{"value": "a", "is_correct": true}, {"value": "b", "is_correct": true}]),
        json!([]),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/question-sets/{}/questions", set.id),
                Some(&token),
                Some(json!({
                    "question_text": "Pick one",
                    "options": options,
                    "new_chapter_name": "Laws",
                    "new_topic_name": "First law",
                })),
            ))
            .await
            .expect("create question");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn existing_topic_video_can_be_updated_while_authoring() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "teacher@example.com", "pass-word").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let set = test_support::insert_question_set(ctx.state.db(), "Thermodynamics").await;
    let chapter = test_support::insert_chapter(ctx.state.db(), "Laws").await;
    let topic = test_support::insert_topic(ctx.state.db(), &chapter, "Second law", None).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/question-sets/{}/questions", set.id),
            Some(&token),
            Some(json!({
                "question_text": "Entropy tends to?",
                "options": [{"value": "Increase", "is_correct": true}, {"value": "Decrease"}],
                "chapter_id": chapter.id,
                "topic_id": topic.id,
                "topic_youtube_link": "https://youtube.com/watch?v=entropy",
            })),
        ))
        .await
        .expect("create question");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/chapters/{}/topics", chapter.id),
            Some(&token),
            None,
        ))
        .await
        .expect("list topics");
    let topics = test_support::read_json(response).await;
    assert_eq!(topics.as_array().unwrap()[0]["youtube_link"], "https://youtube.com/watch?v=entropy");
}

#[tokio::test]
async fn deleting_a_set_removes_its_questions() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "teacher@example.com", "pass-word").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let set = test_support::insert_question_set(ctx.state.db(), "Doomed").await;
    test_support::insert_question(ctx.state.db(), &set, None, "Q1", &["a", "b"], "a").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/question-sets/{}", set.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete set");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let remaining = crate::repositories::questions::list_by_set(ctx.state.db(), &set.id)
        .await
        .expect("list questions");
    assert!(remaining.is_empty());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/question-sets/{}", set.id),
            Some(&token),
            None,
        ))
        .await
        .expect("set detail");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn image_upload_without_storage_is_unavailable() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "teacher@example.com", "pass-word").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let set = test_support::insert_question_set(ctx.state.db(), "Thermodynamics").await;

    let boundary = "X-OMNIA-TEST-BOUNDARY";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"diagram.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         not-really-a-png\r\n\
         --{boundary}--\r\n"
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/question-sets/{}/images", set.id))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .expect("request");

    let response = ctx.app.oneshot(request).await.expect("upload");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
