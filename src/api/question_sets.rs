use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::{sanitized_filename, validate_image_upload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::QuestionOption;
use crate::repositories;
use crate::schemas::question::{QuestionCreate, QuestionResponse};
use crate::schemas::question_set::{
    ImageUploadResponse, QuestionSetCreate, QuestionSetDetailResponse, QuestionSetResponse,
};

pub(crate) fn router() -> Router<AppState> {
    // Multipart uploads need headroom above the configured object size.
    let upload_limit = 32 * 1024 * 1024;

    Router::new()
        .route("/", post(create_set).get(list_sets))
        .route("/:set_id", get(get_set).delete(delete_set))
        .route("/:set_id/questions", post(create_question))
        .route("/:set_id/questions/:question_id", axum::routing::delete(delete_question))
        .route(
            "/:set_id/images",
            post(upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
}

async fn create_set(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionSetCreate>,
) -> Result<(StatusCode, Json<QuestionSetResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let set = repositories::question_sets::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        payload.name.trim(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question set"))?;

    Ok((StatusCode::CREATED, Json(QuestionSetResponse::from_db(set))))
}

async fn list_sets(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionSetResponse>>, ApiError> {
    let sets = repositories::question_sets::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list question sets"))?;

    Ok(Json(sets.into_iter().map(QuestionSetResponse::from_db).collect()))
}

async fn get_set(
    Path(set_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<QuestionSetDetailResponse>, ApiError> {
    let set = repositories::question_sets::find_by_id(state.db(), &set_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question set"))?
        .ok_or_else(|| ApiError::NotFound("Question set not found".to_string()))?;

    let questions = repositories::questions::list_by_set(state.db(), &set_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    Ok(Json(QuestionSetDetailResponse {
        id: set.id,
        name: set.name,
        created_at: crate::core::time::format_primitive(set.created_at),
        questions: questions.into_iter().map(QuestionResponse::from_db).collect(),
    }))
}

async fn delete_set(
    Path(set_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::question_sets::delete_by_id(state.db(), &set_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question set"))?;

    if !deleted {
        return Err(ApiError::NotFound("Question set not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn create_question(
    Path(set_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    repositories::question_sets::find_by_id(state.db(), &set_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question set"))?
        .ok_or_else(|| ApiError::NotFound("Question set not found".to_string()))?;

    let (options, correct_option) = resolve_options(&payload.options)?;
    let now = primitive_now_utc();

    let chapter_id = resolve_chapter(&state, &payload).await?;
    let topic_id = resolve_topic(&state, &payload, &chapter_id).await?;

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            question_text: payload.question_text.trim(),
            options: &options,
            correct_option: &correct_option,
            question_set_id: &set_id,
            chapter_id: Some(chapter_id.as_str()),
            topic_id: Some(topic_id.as_str()),
            youtube_link: normalized(&payload.youtube_link),
            image_url: normalized(&payload.image_url),
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

async fn delete_question(
    Path((set_id, question_id)): Path<(String, String)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::questions::delete_in_set(state.db(), &set_id, &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn upload_image(
    Path(set_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImageUploadResponse>), ApiError> {
    repositories::question_sets::find_by_id(state.db(), &set_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question set"))?
        .ok_or_else(|| ApiError::NotFound("Question set not found".to_string()))?;

    let storage = state.storage().ok_or_else(|| {
        ApiError::ServiceUnavailable(
            "Object storage is not configured; paste an image URL instead".to_string(),
        )
    })?;

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let max_bytes = state.settings().storage().max_upload_size_mb * 1024 * 1024;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name().unwrap_or("") != "file" {
            continue;
        }

        filename = field.file_name().map(|s| s.to_string());
        content_type = field.content_type().map(|s| s.to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
        {
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::BadRequest(format!(
                    "File size exceeds {}MB limit",
                    state.settings().storage().max_upload_size_mb
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        file_bytes = Some(bytes);
    }

    let bytes = file_bytes
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest("A 'file' field is required".to_string()))?;
    let filename =
        filename.ok_or_else(|| ApiError::BadRequest("File must have a name".to_string()))?;
    let content_type = content_type
        .ok_or_else(|| ApiError::BadRequest("File must have a content type".to_string()))?;

    validate_image_upload(
        &filename,
        &content_type,
        &state.settings().storage().allowed_image_extensions,
    )?;

    // Keys are namespaced by question set with a random component so
    // concurrent uploads of the same filename cannot collide.
    let key = format!(
        "question-sets/{set_id}/{}_{}",
        Uuid::new_v4(),
        sanitized_filename(&filename)
    );

    let (size_bytes, sha256) = storage
        .upload_bytes(&key, &content_type, bytes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to upload image"))?;

    Ok((
        StatusCode::CREATED,
        Json(ImageUploadResponse { image_url: storage.public_url(&key), key, size_bytes, sha256 }),
    ))
}

fn resolve_options(
    options: &[crate::schemas::question::QuestionOptionCreate],
) -> Result<(Vec<QuestionOption>, String), ApiError> {
    if options.is_empty() {
        return Err(ApiError::BadRequest("At least one option is required".to_string()));
    }
    if options.iter().any(|option| option.value.trim().is_empty()) {
        return Err(ApiError::BadRequest("Options must not be empty".to_string()));
    }

    let correct: Vec<&str> = options
        .iter()
        .filter(|option| option.is_correct)
        .map(|option| option.value.trim())
        .collect();
    let [correct_option] = correct.as_slice() else {
        return Err(ApiError::BadRequest(
            "Exactly one option must be marked correct".to_string(),
        ));
    };

    let values = options
        .iter()
        .map(|option| QuestionOption { value: option.value.trim().to_string() })
        .collect();

    Ok((values, correct_option.to_string()))
}

async fn resolve_chapter(state: &AppState, payload: &QuestionCreate) -> Result<String, ApiError> {
    if let Some(name) = payload.new_chapter_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    {
        let chapter = repositories::chapters::create(
            state.db(),
            &Uuid::new_v4().to_string(),
            name,
            primitive_now_utc(),
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create chapter"))?;
        return Ok(chapter.id);
    }

    let Some(chapter_id) = payload.chapter_id.as_deref().filter(|id| !id.is_empty()) else {
        return Err(ApiError::BadRequest("Select or create a chapter".to_string()));
    };

    repositories::chapters::find_by_id(state.db(), chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch chapter"))?
        .ok_or_else(|| ApiError::NotFound("Chapter not found".to_string()))?;

    Ok(chapter_id.to_string())
}

async fn resolve_topic(
    state: &AppState,
    payload: &QuestionCreate,
    chapter_id: &str,
) -> Result<String, ApiError> {
    if let Some(name) = payload.new_topic_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        let topic = repositories::topics::create(
            state.db(),
            repositories::topics::CreateTopic {
                id: &Uuid::new_v4().to_string(),
                name,
                chapter_id,
                youtube_link: normalized(&payload.new_topic_youtube_link),
                created_at: primitive_now_utc(),
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create topic"))?;
        return Ok(topic.id);
    }

    let Some(topic_id) = payload.topic_id.as_deref().filter(|id| !id.is_empty()) else {
        return Err(ApiError::BadRequest("Select or create a topic".to_string()));
    };

    let topic = repositories::topics::find_by_id(state.db(), topic_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch topic"))?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    if topic.chapter_id != chapter_id {
        return Err(ApiError::BadRequest(
            "Topic does not belong to the selected chapter".to_string(),
        ));
    }

    // Authoring may refresh the review video of an existing topic in the
    // same request.
    if let Some(link) = payload.topic_youtube_link.as_deref() {
        let new_link = if link.trim().is_empty() { None } else { Some(link.trim()) };
        if new_link != topic.youtube_link.as_deref() {
            repositories::topics::update_youtube_link(state.db(), topic_id, new_link)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to update topic video"))?;
        }
    }

    Ok(topic.id)
}

fn normalized(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests;
