use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{StudentAnswer, StudentExam};
use crate::db::types::AttemptStatus;

pub(crate) const COLUMNS: &str = "\
    id, student_id, exam_id, status, started_at, submitted_at, expires_at, \
    score, time_taken_seconds, saved_answers, current_question_index, \
    created_at, updated_at";

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) expires_at: PrimitiveDateTime,
}

/// One graded answer row, bulk-inserted at submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnswerRow {
    pub(crate) question_id: String,
    pub(crate) selected_option: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

/// Attempt header joined with the exam title and student name for the
/// results view.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ResultHeader {
    pub(crate) id: String,
    pub(crate) status: AttemptStatus,
    pub(crate) score: Option<i32>,
    pub(crate) time_taken_seconds: Option<i32>,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) exam_title: String,
    pub(crate) student_name: String,
}

/// A stored answer joined (left) with its question and topic. The
/// question side is optional: questions may be deleted after the attempt.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AnswerReportRow {
    pub(crate) question_id: String,
    pub(crate) selected_option: String,
    pub(crate) is_correct: bool,
    pub(crate) question_text: Option<String>,
    pub(crate) correct_option: Option<String>,
    pub(crate) question_youtube_link: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) topic_name: Option<String>,
    pub(crate) topic_youtube_link: Option<String>,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAttempt<'_>,
) -> Result<StudentExam, sqlx::Error> {
    sqlx::query_as::<_, StudentExam>(&format!(
        "INSERT INTO student_exams (
            id, student_id, exam_id, status, started_at, expires_at,
            saved_answers, current_question_index, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,'{{}}',0,$5,$5)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.exam_id)
    .bind(AttemptStatus::InProgress)
    .bind(params.started_at)
    .bind(params.expires_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<StudentExam>, sqlx::Error> {
    sqlx::query_as::<_, StudentExam>(&format!(
        "SELECT {COLUMNS} FROM student_exams WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Overwrites the selection for one question and moves the bookmark.
pub(crate) async fn save_answer(
    pool: &PgPool,
    id: &str,
    question_id: &str,
    selected_option: &str,
    current_question_index: i32,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE student_exams
         SET saved_answers = jsonb_set(saved_answers, ARRAY[$2]::text[], to_jsonb($3::text), true),
             current_question_index = $4,
             updated_at = $5
         WHERE id = $1",
    )
    .bind(id)
    .bind(question_id)
    .bind(selected_option)
    .bind(current_question_index)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// The idempotence gate for submission: only the caller that flips the
/// status from in_progress wins; everyone else sees zero rows affected.
pub(crate) async fn claim_submission(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    score: i32,
    time_taken_seconds: i32,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE student_exams
         SET status = $2, score = $3, time_taken_seconds = $4, submitted_at = $5, updated_at = $5
         WHERE id = $1 AND status = $6",
    )
    .bind(id)
    .bind(AttemptStatus::Submitted)
    .bind(score)
    .bind(time_taken_seconds)
    .bind(now)
    .bind(AttemptStatus::InProgress)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn insert_answers(
    executor: impl sqlx::PgExecutor<'_>,
    student_exam_id: &str,
    answers: &[AnswerRow],
) -> Result<(), sqlx::Error> {
    if answers.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO student_answers \
         (student_exam_id, question_id, selected_option, is_correct, order_index) ",
    );
    builder.push_values(answers, |mut row, answer| {
        row.push_bind(student_exam_id);
        row.push_bind(&answer.question_id);
        row.push_bind(&answer.selected_option);
        row.push_bind(answer.is_correct);
        row.push_bind(answer.order_index);
    });
    builder.push(" ON CONFLICT (student_exam_id, question_id) DO NOTHING");

    builder.build().execute(executor).await?;
    Ok(())
}

pub(crate) async fn list_answers(
    pool: &PgPool,
    student_exam_id: &str,
) -> Result<Vec<StudentAnswer>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnswer>(
        "SELECT student_exam_id, question_id, selected_option, is_correct, order_index
         FROM student_answers
         WHERE student_exam_id = $1
         ORDER BY order_index",
    )
    .bind(student_exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_overdue(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<Vec<StudentExam>, sqlx::Error> {
    sqlx::query_as::<_, StudentExam>(&format!(
        "SELECT {COLUMNS} FROM student_exams WHERE status = $1 AND expires_at <= $2"
    ))
    .bind(AttemptStatus::InProgress)
    .bind(now)
    .fetch_all(pool)
    .await
}

pub(crate) async fn fetch_result_header(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ResultHeader>, sqlx::Error> {
    sqlx::query_as::<_, ResultHeader>(
        "SELECT se.id,
                se.status,
                se.score,
                se.time_taken_seconds,
                se.submitted_at,
                e.title AS exam_title,
                s.name AS student_name
         FROM student_exams se
         JOIN exams e ON e.id = se.exam_id
         JOIN students s ON s.id = se.student_id
         WHERE se.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_report_rows(
    pool: &PgPool,
    student_exam_id: &str,
) -> Result<Vec<AnswerReportRow>, sqlx::Error> {
    sqlx::query_as::<_, AnswerReportRow>(
        "SELECT a.question_id,
                a.selected_option,
                a.is_correct,
                q.question_text,
                q.correct_option,
                q.youtube_link AS question_youtube_link,
                q.image_url,
                t.name AS topic_name,
                t.youtube_link AS topic_youtube_link
         FROM student_answers a
         LEFT JOIN questions q ON q.id = a.question_id
         LEFT JOIN topics t ON t.id = q.topic_id
         WHERE a.student_exam_id = $1
         ORDER BY a.order_index",
    )
    .bind(student_exam_id)
    .fetch_all(pool)
    .await
}
