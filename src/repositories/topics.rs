use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Topic;

const COLUMNS: &str = "id, name, chapter_id, youtube_link, created_at";

pub(crate) struct CreateTopic<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) chapter_id: &'a str,
    pub(crate) youtube_link: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateTopic<'_>) -> Result<Topic, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "INSERT INTO topics (id, name, chapter_id, youtube_link, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.chapter_id)
    .bind(params.youtube_link)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!("SELECT {COLUMNS} FROM topics WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_chapter(
    pool: &PgPool,
    chapter_id: &str,
) -> Result<Vec<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "SELECT {COLUMNS} FROM topics WHERE chapter_id = $1 ORDER BY name"
    ))
    .bind(chapter_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update_youtube_link(
    pool: &PgPool,
    id: &str,
    youtube_link: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE topics SET youtube_link = $1 WHERE id = $2")
        .bind(youtube_link)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
