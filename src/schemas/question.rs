use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Question, QuestionOption};

/// One authoring-form option row; exactly one must be flagged correct.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QuestionOptionCreate {
    pub(crate) value: String,
    #[serde(default)]
    pub(crate) is_correct: bool,
}

/// Question authoring payload. The chapter and topic are either picked by
/// id or created inline by name, mirroring the set-editing form.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: String,
    pub(crate) options: Vec<QuestionOptionCreate>,
    #[serde(default)]
    pub(crate) chapter_id: Option<String>,
    #[serde(default)]
    pub(crate) new_chapter_name: Option<String>,
    #[serde(default)]
    pub(crate) topic_id: Option<String>,
    #[serde(default)]
    pub(crate) new_topic_name: Option<String>,
    #[serde(default)]
    pub(crate) new_topic_youtube_link: Option<String>,
    /// When set alongside `topic_id`, replaces that topic's review video.
    #[serde(default)]
    pub(crate) topic_youtube_link: Option<String>,
    #[serde(default)]
    pub(crate) youtube_link: Option<String>,
    #[serde(default)]
    pub(crate) image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) options: Vec<QuestionOption>,
    pub(crate) correct_option: String,
    pub(crate) question_set_id: String,
    pub(crate) chapter_id: Option<String>,
    pub(crate) topic_id: Option<String>,
    pub(crate) youtube_link: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            options: question.options.0,
            correct_option: question.correct_option,
            question_set_id: question.question_set_id,
            chapter_id: question.chapter_id,
            topic_id: question.topic_id,
            youtube_link: question.youtube_link,
            image_url: question.image_url,
            created_at: format_primitive(question.created_at),
        }
    }
}
