use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Question, QuestionOption};

pub(crate) const COLUMNS: &str = "\
    id, question_text, options, correct_option, question_set_id, \
    chapter_id, topic_id, youtube_link, image_url, created_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) question_text: &'a str,
    pub(crate) options: &'a [QuestionOption],
    pub(crate) correct_option: &'a str,
    pub(crate) question_set_id: &'a str,
    pub(crate) chapter_id: Option<&'a str>,
    pub(crate) topic_id: Option<&'a str>,
    pub(crate) youtube_link: Option<&'a str>,
    pub(crate) image_url: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    let options =
        serde_json::to_value(params.options).unwrap_or_else(|_| serde_json::json!([]));

    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, question_text, options, correct_option, question_set_id,
            chapter_id, topic_id, youtube_link, image_url, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.question_text)
    .bind(options)
    .bind(params.correct_option)
    .bind(params.question_set_id)
    .bind(params.chapter_id)
    .bind(params.topic_id)
    .bind(params.youtube_link)
    .bind(params.image_url)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_set(
    pool: &PgPool,
    question_set_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE question_set_id = $1 ORDER BY created_at, id"
    ))
    .bind(question_set_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_ids_by_set(
    pool: &PgPool,
    question_set_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT id FROM questions WHERE question_set_id = $1 ORDER BY created_at, id",
    )
    .bind(question_set_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete_in_set(
    pool: &PgPool,
    question_set_id: &str,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1 AND question_set_id = $2")
        .bind(id)
        .bind(question_set_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
