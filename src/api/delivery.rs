use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tokio::time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::validation::validate_student_email;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, seconds_until};
use crate::db::models::StudentExam;
use crate::db::types::AttemptStatus;
use crate::repositories;
use crate::schemas::attempt::{
    attempt_to_response, attempt_to_state, AnswerSave, AttemptResponse, AttemptStart,
    AttemptStateResponse, PaperExam, PaperQuestion, PaperResponse, SubmitResponse,
};
use crate::services::{delivery, grading};

/// Max registrations per window and email.
const START_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const START_RATE_WINDOW_SECONDS: u64 = 60;

/// Public routes merged into the `/exams` nest.
pub(crate) fn paper_router() -> Router<AppState> {
    Router::new()
        .route("/:exam_id/paper", get(get_paper))
        .route("/:exam_id/attempts", post(start_attempt))
}

/// Public routes for a running attempt, nested under `/attempts`.
pub(crate) fn attempts_router() -> Router<AppState> {
    Router::new()
        .route("/:attempt_id", get(get_attempt))
        .route("/:attempt_id/answers", put(save_answer))
        .route("/:attempt_id/submit", post(submit_attempt))
}

/// The paper a student sees: snapshot questions in a fresh uniform random
/// order, with the answer key stripped. Nothing is persisted, so every
/// load shuffles again while the id set stays fixed.
async fn get_paper(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PaperResponse>, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let mut questions = repositories::exams::list_questions(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam questions"))?;

    delivery::shuffle_paper(&mut questions, &mut rand::thread_rng());

    let paper: Vec<PaperQuestion> = questions
        .into_iter()
        .map(|question| PaperQuestion {
            id: question.id,
            question_text: question.question_text,
            options: question.options.0,
            image_url: question.image_url,
        })
        .collect();

    Ok(Json(PaperResponse {
        exam: PaperExam {
            id: exam.id,
            title: exam.title,
            duration_minutes: exam.duration_minutes,
            question_count: paper.len(),
        },
        questions: paper,
    }))
}

/// NOT_STARTED -> IN_PROGRESS. Upserts the student by email and opens the
/// attempt in one transaction, then arms the countdown. A failed start
/// leaves nothing behind and can be retried by resubmitting the form.
async fn start_attempt(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<AttemptStart>,
) -> Result<(StatusCode, Json<AttemptResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_student_email(&payload.email)?;

    let email = payload.email.trim().to_ascii_lowercase();
    let rate_key = format!("rl:attempt-start:{email}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, START_RATE_LIMIT, START_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::Forbidden("Too many attempts started, try again later"));
    }

    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let now = primitive_now_utc();
    let expires_at = now + time::Duration::minutes(i64::from(exam.duration_minutes));

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let student = repositories::students::upsert_by_email(
        &mut *tx,
        &Uuid::new_v4().to_string(),
        payload.name.trim(),
        &email,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to register student"))?;

    let attempt = repositories::attempts::create(
        &mut *tx,
        repositories::attempts::CreateAttempt {
            id: &Uuid::new_v4().to_string(),
            student_id: &student.id,
            exam_id: &exam.id,
            started_at: now,
            expires_at,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to start attempt"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("attempts_started_total").increment(1);
    arm_auto_submit(&state, &attempt.id, i64::from(exam.duration_minutes) * 60);

    Ok((StatusCode::CREATED, Json(attempt_to_response(attempt))))
}

/// Current attempt state, for restoring a reloaded delivery client.
async fn get_attempt(
    Path(attempt_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AttemptStateResponse>, ApiError> {
    let attempt = fetch_attempt(&state, &attempt_id).await?;
    let attempt = enforce_deadline(&state, attempt).await?;
    Ok(Json(attempt_to_state(attempt)))
}

/// Records one selection, overwriting any previous choice for the same
/// question. Skipped questions stay absent from the map until answered.
async fn save_answer(
    Path(attempt_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<AnswerSave>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let attempt = fetch_attempt(&state, &attempt_id).await?;
    let attempt = enforce_deadline(&state, attempt).await?;

    if attempt.status != AttemptStatus::InProgress {
        return Err(ApiError::BadRequest("Attempt has already been submitted".to_string()));
    }

    let keys = repositories::exams::list_answer_keys(state.db(), &attempt.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam questions"))?;

    if !keys.iter().any(|key| key.question_id == payload.question_id) {
        return Err(ApiError::BadRequest("Question is not part of this exam".to_string()));
    }

    let last_index = keys.len().saturating_sub(1) as i32;
    let current_question_index = payload
        .current_question_index
        .unwrap_or(attempt.current_question_index)
        .clamp(0, last_index);

    let now = primitive_now_utc();
    repositories::attempts::save_answer(
        state.db(),
        &attempt.id,
        &payload.question_id,
        &payload.selected_option,
        current_question_index,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save answer"))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "time_remaining": seconds_until(attempt.expires_at, now),
        "current_question_index": current_question_index,
    })))
}

/// IN_PROGRESS -> SUBMITTED, explicitly. Shares the finalization path
/// with the countdown task and the expiry sweep, so a lingering timer
/// racing a manual click cannot double-submit.
async fn submit_attempt(
    Path(attempt_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let attempt = fetch_attempt(&state, &attempt_id).await?;
    let attempt = finalize_attempt(&state, attempt, false).await?;
    state.timers().stop(&attempt.id);

    Ok(Json(SubmitResponse {
        attempt_id: attempt.id,
        score: attempt.score,
        time_taken_seconds: attempt.time_taken_seconds,
        submitted_at: attempt.submitted_at.map(crate::core::time::format_primitive),
    }))
}

/// Grades and closes an attempt exactly once.
///
/// The status-guarded claim update is the idempotence gate: whichever of
/// the manual submit, the countdown task, or the expiry sweep gets there
/// first writes the answers and the score; every later caller loses the
/// claim and reads back the stored result untouched.
pub(crate) async fn finalize_attempt(
    state: &AppState,
    attempt: StudentExam,
    auto: bool,
) -> Result<StudentExam, ApiError> {
    if attempt.status == AttemptStatus::Submitted {
        return Ok(attempt);
    }

    let exam = repositories::exams::find_by_id(state.db(), &attempt.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let keys = repositories::exams::list_answer_keys(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch answer keys"))?;

    let (rows, correct) = grading::grade_attempt(&keys, &attempt.saved_answers.0);
    let score = grading::percentage_score(correct, keys.len());

    let now = primitive_now_utc();
    let remaining = if auto { 0 } else { seconds_until(attempt.expires_at, now) };
    let time_taken = grading::time_taken_seconds(exam.duration_minutes, remaining);

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let claimed =
        repositories::attempts::claim_submission(&mut *tx, &attempt.id, score, time_taken, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to claim submission"))?;

    if !claimed {
        tx.rollback().await.map_err(|e| ApiError::internal(e, "Failed to roll back"))?;
        return fetch_attempt(state, &attempt.id).await;
    }

    repositories::attempts::insert_answers(&mut *tx, &attempt.id, &rows)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store answers"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("attempts_submitted_total").increment(1);
    if auto {
        metrics::counter!("attempts_auto_submitted_total").increment(1);
        tracing::info!(attempt_id = %attempt.id, "Attempt auto-submitted at deadline");
    }

    fetch_attempt(state, &attempt.id).await
}

/// Arms the attempt's countdown. Re-entrant: a live timer keeps ownership.
pub(crate) fn arm_auto_submit(state: &AppState, attempt_id: &str, fire_in_seconds: i64) {
    let task_state = state.clone();
    let owner = attempt_id.to_string();
    let fire_in = Duration::from_secs(fire_in_seconds.max(0) as u64);

    state.timers().start(attempt_id, fire_in, move || async move {
        match repositories::attempts::find_by_id(task_state.db(), &owner).await {
            Ok(Some(attempt)) => {
                if let Err(err) = finalize_attempt(&task_state, attempt, true).await {
                    tracing::error!(attempt_id = %owner, error = ?err, "Auto-submit failed");
                }
            }
            Ok(None) => {
                tracing::warn!(attempt_id = %owner, "Attempt vanished before auto-submit");
            }
            Err(err) => {
                tracing::error!(attempt_id = %owner, error = %err, "Auto-submit lookup failed");
            }
        }
    });
}

async fn fetch_attempt(state: &AppState, attempt_id: &str) -> Result<StudentExam, ApiError> {
    repositories::attempts::find_by_id(state.db(), attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))
}

/// Lazy deadline enforcement: any read or write that finds the clock run
/// out finalizes the attempt first, covering timers lost to a restart.
async fn enforce_deadline(
    state: &AppState,
    attempt: StudentExam,
) -> Result<StudentExam, ApiError> {
    if attempt.status == AttemptStatus::InProgress
        && seconds_until(attempt.expires_at, primitive_now_utc()) == 0
    {
        let attempt_id = attempt.id.clone();
        let finalized = finalize_attempt(state, attempt, true).await?;
        state.timers().stop(&attempt_id);
        return Ok(finalized);
    }

    Ok(attempt)
}

#[cfg(test)]
mod tests;
