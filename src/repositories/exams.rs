use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{Exam, Question};

pub(crate) const COLUMNS: &str = "id, title, duration_minutes, created_at";

/// Answer key for one snapshot question, the only thing grading needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ExamAnswerKey {
    pub(crate) question_id: String,
    pub(crate) correct_option: String,
}

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) duration_minutes: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateExam<'_>,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (id, title, duration_minutes, created_at)
         VALUES ($1,$2,$3,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.duration_minutes)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Freezes the exam content: one join row per question id, in the order
/// the set listed them at composition time.
pub(crate) async fn insert_exam_questions(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    question_ids: &[String],
) -> Result<(), sqlx::Error> {
    if question_ids.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO exam_questions (exam_id, question_id, order_index) ",
    );
    builder.push_values(question_ids.iter().enumerate(), |mut row, (index, question_id)| {
        row.push_bind(exam_id);
        row.push_bind(question_id);
        row.push_bind(index as i32);
    });

    builder.build().execute(executor).await?;
    Ok(())
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams ORDER BY created_at DESC"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn count_questions(pool: &PgPool, exam_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_questions WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_questions(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {} FROM exam_questions eq
         JOIN questions q ON q.id = eq.question_id
         WHERE eq.exam_id = $1
         ORDER BY eq.order_index",
        qualified_question_columns()
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_answer_keys(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<ExamAnswerKey>, sqlx::Error> {
    sqlx::query_as::<_, ExamAnswerKey>(
        "SELECT eq.question_id, q.correct_option
         FROM exam_questions eq
         JOIN questions q ON q.id = eq.question_id
         WHERE eq.exam_id = $1
         ORDER BY eq.order_index",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

fn qualified_question_columns() -> String {
    crate::repositories::questions::COLUMNS
        .split(',')
        .map(|column| format!("q.{}", column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
