use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::format_primitive;
use crate::db::types::AttemptStatus;
use crate::repositories;
use crate::repositories::attempts::AnswerReportRow;
use crate::schemas::results::{MistakenAnswer, ResultResponse, TopicGroup};

const NO_TOPIC: &str = "No Topic";

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:attempt_id", get(get_results))
}

async fn get_results(
    Path(attempt_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ResultResponse>, ApiError> {
    let header = repositories::attempts::fetch_result_header(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("Results not found".to_string()))?;

    if header.status != AttemptStatus::Submitted {
        return Err(ApiError::BadRequest("Attempt has not been submitted yet".to_string()));
    }

    let rows = repositories::attempts::list_report_rows(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch answers"))?;

    let (mistake_count, mistaken_topics) = group_mistakes(rows);

    Ok(Json(ResultResponse {
        attempt_id: header.id,
        exam_title: header.exam_title,
        student_name: header.student_name,
        score: header.score.unwrap_or(0),
        time_taken_seconds: header.time_taken_seconds.unwrap_or(0),
        submitted_at: header.submitted_at.map(format_primitive),
        mistake_count,
        mistaken_topics,
    }))
}

/// Buckets mistaken answers by topic, falling back to a "No Topic" group.
/// Group order is first occurrence; answers keep their stored order.
/// Answers whose question no longer resolves are not remediable and are
/// left out entirely.
fn group_mistakes(rows: Vec<AnswerReportRow>) -> (usize, Vec<TopicGroup>) {
    let mut groups: Vec<TopicGroup> = Vec::new();
    let mut mistake_count = 0;

    for row in rows {
        if row.is_correct {
            continue;
        }
        let Some(question_text) = row.question_text else {
            continue;
        };
        mistake_count += 1;

        let topic_name = row.topic_name.unwrap_or_else(|| NO_TOPIC.to_string());
        let answer = MistakenAnswer {
            question_id: row.question_id,
            question_text,
            selected_option: row.selected_option,
            correct_option: row.correct_option.unwrap_or_default(),
            youtube_link: row.question_youtube_link,
            image_url: row.image_url,
        };

        match groups.iter_mut().find(|group| group.topic_name == topic_name) {
            Some(group) => group.questions.push(answer),
            None => groups.push(TopicGroup {
                topic_name,
                youtube_link: row.topic_youtube_link,
                questions: vec![answer],
            }),
        }
    }

    (mistake_count, groups)
}
