use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::catalog::{ChapterResponse, TopicResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_chapters))
        .route("/:chapter_id/topics", get(list_topics))
}

async fn list_chapters(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ChapterResponse>>, ApiError> {
    let chapters = repositories::chapters::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list chapters"))?;

    Ok(Json(chapters.into_iter().map(ChapterResponse::from_db).collect()))
}

async fn list_topics(
    Path(chapter_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<TopicResponse>>, ApiError> {
    repositories::chapters::find_by_id(state.db(), &chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch chapter"))?
        .ok_or_else(|| ApiError::NotFound("Chapter not found".to_string()))?;

    let topics = repositories::topics::list_by_chapter(state.db(), &chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list topics"))?;

    Ok(Json(topics.into_iter().map(TopicResponse::from_db).collect()))
}
