//! services/api/src/web/protocol.rs
//!
//! Defines the request and response payloads exchanged between the
//! browser client and the API server, and their conversions from the
//! core's domain types.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use study_spark_core::domain::{FaqEntry, MindMapImage, QuizQuestion, StudyAid};
use study_spark_core::lane::LaneState;
use study_spark_core::quiz::AnswerFeedback;
use study_spark_core::session::StudySession;
use utoipa::ToSchema;

use crate::web::workflow::AidOutcome;

//=========================================================================================
// Upload / Extraction
//=========================================================================================

/// Acknowledges an uploaded image.
#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub file_name: String,
    pub size_bytes: usize,
}

/// The extracted study-material text.
#[derive(Serialize)]
pub struct ExtractionResponse {
    pub text: String,
}

//=========================================================================================
// Study Aids
//=========================================================================================

/// The displayable form of a generated study aid.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AidView {
    Summary { text: String },
    Quiz { questions: Vec<QuizQuestion> },
    Faq { entries: Vec<FaqEntry> },
    MindMap { mime_type: String, image_base64: String },
}

impl From<AidOutcome> for AidView {
    fn from(outcome: AidOutcome) -> Self {
        match outcome {
            AidOutcome::Aid(StudyAid::Summary(text)) => AidView::Summary { text },
            AidOutcome::Aid(StudyAid::Quiz(questions)) => AidView::Quiz { questions },
            AidOutcome::Aid(StudyAid::Faq(entries)) => AidView::Faq { entries },
            // The description never leaves the server; a mind map is
            // only displayable once the image stage produced one.
            AidOutcome::Aid(StudyAid::MindMapDescription(text)) => AidView::Summary { text },
            AidOutcome::MindMap(image) => AidView::from(image),
        }
    }
}

impl From<MindMapImage> for AidView {
    fn from(image: MindMapImage) -> Self {
        AidView::MindMap {
            mime_type: image.mime_type,
            image_base64: BASE64.encode(&image.data),
        }
    }
}

//=========================================================================================
// Enrichment
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ExplainRequest {
    pub concept: String,
}

/// A free-text generation result (explanation or examples).
#[derive(Serialize)]
pub struct TextResponse {
    pub text: String,
}

//=========================================================================================
// Quiz
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct QuizAnswerRequest {
    pub question_index: usize,
    pub option_index: usize,
}

/// Feedback for one submitted answer plus the running score.
#[derive(Serialize, ToSchema)]
pub struct QuizAnswerResponse {
    pub is_correct: bool,
    pub correct_answer_index: usize,
    pub explanation: String,
    pub score: usize,
    pub answered: usize,
    pub total: usize,
    pub completed: bool,
    /// The score line shown when the quiz completes, e.g. `3 / 5`.
    pub score_display: String,
}

impl From<AnswerFeedback> for QuizAnswerResponse {
    fn from(feedback: AnswerFeedback) -> Self {
        Self {
            score_display: format!("{} / {}", feedback.score, feedback.total),
            is_correct: feedback.is_correct,
            correct_answer_index: feedback.correct_answer_index,
            explanation: feedback.explanation,
            score: feedback.score,
            answered: feedback.answered,
            total: feedback.total,
            completed: feedback.completed,
        }
    }
}

//=========================================================================================
// Session Snapshot
//=========================================================================================

/// The request/result state of one feature lane, as shown to clients.
#[derive(Serialize)]
pub struct LaneView {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LaneView {
    fn from_lane<T>(lane: &LaneState<T>) -> Self {
        Self {
            status: lane.status().to_string(),
            error: lane.error().map(|e| e.to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct QuizProgress {
    pub answered: usize,
    pub total: usize,
    pub score: usize,
    pub completed: bool,
}

/// A snapshot of the whole session for the client to render.
#[derive(Serialize)]
pub struct SessionView {
    pub has_image: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aid_type: Option<String>,
    pub extraction: LaneView,
    pub study_aid: LaneView,
    pub mind_map_image: LaneView,
    pub explanation: LaneView,
    pub examples: LaneView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizProgress>,
}

impl SessionView {
    pub fn from_session(session: &StudySession) -> Self {
        Self {
            has_image: session.image().is_some(),
            aid_type: session.aid_type().map(|aid_type| aid_type.as_str().to_string()),
            extraction: LaneView::from_lane(session.extraction()),
            study_aid: LaneView::from_lane(session.study_aid()),
            mind_map_image: LaneView::from_lane(session.mind_map()),
            explanation: LaneView::from_lane(session.explanation()),
            examples: LaneView::from_lane(session.examples()),
            quiz: session.quiz().map(|attempt| QuizProgress {
                answered: attempt.answered(),
                total: attempt.total(),
                score: attempt.score(),
                completed: attempt.is_complete(),
            }),
        }
    }
}
