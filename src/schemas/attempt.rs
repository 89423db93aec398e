use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_primitive, primitive_now_utc, seconds_until};
use crate::db::models::{QuestionOption, StudentExam};
use crate::db::types::AttemptStatus;

/// Registration form shown before the countdown starts.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttemptStart {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, max = 320, message = "email must not be empty"))]
    pub(crate) email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerSave {
    pub(crate) question_id: String,
    pub(crate) selected_option: String,
    #[serde(default)]
    pub(crate) current_question_index: Option<i32>,
}

/// A question as shown to the student: no answer key.
#[derive(Debug, Serialize)]
pub(crate) struct PaperQuestion {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) options: Vec<QuestionOption>,
    pub(crate) image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PaperExam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) duration_minutes: i32,
    pub(crate) question_count: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct PaperResponse {
    pub(crate) exam: PaperExam,
    pub(crate) questions: Vec<PaperQuestion>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) status: AttemptStatus,
    pub(crate) started_at: String,
    pub(crate) expires_at: String,
    pub(crate) time_remaining: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptStateResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) status: AttemptStatus,
    pub(crate) time_remaining: i64,
    pub(crate) saved_answers: HashMap<String, String>,
    pub(crate) current_question_index: i32,
    pub(crate) score: Option<i32>,
    pub(crate) time_taken_seconds: Option<i32>,
    pub(crate) submitted_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) attempt_id: String,
    pub(crate) score: Option<i32>,
    pub(crate) time_taken_seconds: Option<i32>,
    pub(crate) submitted_at: Option<String>,
}

pub(crate) fn attempt_to_response(attempt: StudentExam) -> AttemptResponse {
    let time_remaining = remaining_seconds(&attempt);
    AttemptResponse {
        id: attempt.id,
        exam_id: attempt.exam_id,
        status: attempt.status,
        started_at: format_primitive(attempt.started_at),
        expires_at: format_primitive(attempt.expires_at),
        time_remaining,
    }
}

pub(crate) fn attempt_to_state(attempt: StudentExam) -> AttemptStateResponse {
    let time_remaining = remaining_seconds(&attempt);
    AttemptStateResponse {
        id: attempt.id,
        exam_id: attempt.exam_id,
        status: attempt.status,
        time_remaining,
        saved_answers: attempt.saved_answers.0,
        current_question_index: attempt.current_question_index,
        score: attempt.score,
        time_taken_seconds: attempt.time_taken_seconds,
        submitted_at: attempt.submitted_at.map(format_primitive),
    }
}

fn remaining_seconds(attempt: &StudentExam) -> i64 {
    match attempt.status {
        AttemptStatus::InProgress => seconds_until(attempt.expires_at, primitive_now_utc()),
        AttemptStatus::Submitted => 0,
    }
}
