use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::QuestionSet;

const COLUMNS: &str = "id, name, created_at";

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    name: &str,
    now: PrimitiveDateTime,
) -> Result<QuestionSet, sqlx::Error> {
    sqlx::query_as::<_, QuestionSet>(&format!(
        "INSERT INTO question_sets (id, name, created_at) VALUES ($1,$2,$3) RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<QuestionSet>, sqlx::Error> {
    sqlx::query_as::<_, QuestionSet>(&format!("SELECT {COLUMNS} FROM question_sets WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<QuestionSet>, sqlx::Error> {
    sqlx::query_as::<_, QuestionSet>(&format!(
        "SELECT {COLUMNS} FROM question_sets ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM question_sets WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
