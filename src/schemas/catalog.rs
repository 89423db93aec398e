use serde::Serialize;

use crate::db::models::{Chapter, Topic};

#[derive(Debug, Serialize)]
pub(crate) struct ChapterResponse {
    pub(crate) id: String,
    pub(crate) name: String,
}

impl ChapterResponse {
    pub(crate) fn from_db(chapter: Chapter) -> Self {
        Self { id: chapter.id, name: chapter.name }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) chapter_id: String,
    pub(crate) youtube_link: Option<String>,
}

impl TopicResponse {
    pub(crate) fn from_db(topic: Topic) -> Self {
        Self {
            id: topic.id,
            name: topic.name,
            chapter_id: topic.chapter_id,
            youtube_link: topic.youtube_link,
        }
    }
}
