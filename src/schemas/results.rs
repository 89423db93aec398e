use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct ResultResponse {
    pub(crate) attempt_id: String,
    pub(crate) exam_title: String,
    pub(crate) student_name: String,
    pub(crate) score: i32,
    pub(crate) time_taken_seconds: i32,
    pub(crate) submitted_at: Option<String>,
    pub(crate) mistake_count: usize,
    pub(crate) mistaken_topics: Vec<TopicGroup>,
}

/// Remediation bucket: the mistaken answers of one topic, in the order
/// they were stored at submission.
#[derive(Debug, Serialize)]
pub(crate) struct TopicGroup {
    pub(crate) topic_name: String,
    pub(crate) youtube_link: Option<String>,
    pub(crate) questions: Vec<MistakenAnswer>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MistakenAnswer {
    pub(crate) question_id: String,
    pub(crate) question_text: String,
    pub(crate) selected_option: String,
    pub(crate) correct_option: String,
    pub(crate) youtube_link: Option<String>,
    pub(crate) image_url: Option<String>,
}
