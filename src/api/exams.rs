use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::{ExamCreate, ExamResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(compose_exam).get(list_exams))
        .route("/:exam_id", axum::routing::delete(delete_exam))
}

/// Snapshots the question set into a new exam. The exam row and its join
/// rows land in one transaction, so a failure cannot leave an orphaned
/// empty exam behind.
async fn compose_exam(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    repositories::question_sets::find_by_id(state.db(), &payload.question_set_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question set"))?
        .ok_or_else(|| ApiError::NotFound("Question set not found".to_string()))?;

    let question_ids =
        repositories::questions::list_ids_by_set(state.db(), &payload.question_set_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    if question_ids.is_empty() {
        return Err(ApiError::EmptySet(
            "Cannot compose an exam from a question set with no questions".to_string(),
        ));
    }

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let exam = repositories::exams::create(
        &mut *tx,
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            duration_minutes: payload.duration_minutes,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    repositories::exams::insert_exam_questions(&mut *tx, &exam.id, &question_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to link exam questions"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("exams_composed_total").increment(1);

    let question_count = question_ids.len() as i64;
    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam, question_count))))
}

async fn list_exams(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let exams = repositories::exams::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let mut responses = Vec::with_capacity(exams.len());
    for exam in exams {
        let question_count = repositories::exams::count_questions(state.db(), &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count exam questions"))?;
        responses.push(ExamResponse::from_db(exam, question_count));
    }

    Ok(Json(responses))
}

async fn delete_exam(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::exams::delete_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
