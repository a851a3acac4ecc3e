//! crates/study_spark_core/src/session.rs
//!
//! The per-user workflow state machine. A session owns the uploaded
//! image, the extraction result, one lane per feature, the quiz
//! attempt, and the concurrency discipline: an exclusive in-flight
//! token plus a monotonic epoch that discards stale completions.
//!
//! Network calls never happen here. Callers `begin_*` a request (which
//! validates preconditions and stages the inputs), perform the call
//! with no session lock held, and then `complete_*` it; a completion
//! whose epoch no longer matches is dropped instead of applied.

use crate::domain::{
    AidRequest, AidType, GeneratedAid, HistoryRecord, MindMapImage, StudyAid, UploadedImage,
    UserProfile,
};
use crate::lane::{Feature, LaneState};
use crate::ports::{WorkflowError, WorkflowResult};
use crate::quiz::{AnswerFeedback, QuizAnswerError, QuizAttempt};
use uuid::Uuid;

/// Proof that a request was started through [`StudySession::begin`]
/// machinery. Completions must present it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    feature: Feature,
    epoch: u64,
}

impl RequestTicket {
    pub fn feature(&self) -> Feature {
        self.feature
    }
}

/// Whether a completion was applied or arrived for a superseded epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Completion {
    Applied,
    Stale,
}

/// Outcome of completing a study-aid generation.
#[derive(Debug, PartialEq)]
#[must_use]
pub enum AidCompletion {
    /// The result (or error) now sits in the study-aid lane. On
    /// success the record for the audit trail is handed back so the
    /// caller can persist it best-effort.
    Applied { history: Option<HistoryRecord> },
    /// Stage one of the mind-map flow produced a description; the
    /// caller must now run the image stage under the returned ticket.
    /// The generator lane is already cleared so the two stages stay
    /// independently observable.
    MindMapStage {
        ticket: RequestTicket,
        description: String,
    },
    /// The result arrived for a superseded epoch and was dropped.
    Stale,
}

/// Everything one user's page session tracks.
pub struct StudySession {
    user_id: Uuid,
    profile: UserProfile,
    image: Option<UploadedImage>,
    epoch: u64,
    in_flight: Option<Feature>,
    extraction: LaneState<String>,
    study_aid: LaneState<StudyAid>,
    aid_type: Option<AidType>,
    mind_map: LaneState<MindMapImage>,
    explanation: LaneState<String>,
    examples: LaneState<String>,
    quiz: Option<QuizAttempt>,
}

impl StudySession {
    pub fn new(user_id: Uuid, profile: UserProfile) -> Self {
        Self {
            user_id,
            profile,
            image: None,
            epoch: 0,
            in_flight: None,
            extraction: LaneState::Idle,
            study_aid: LaneState::Idle,
            aid_type: None,
            mind_map: LaneState::Idle,
            explanation: LaneState::Idle,
            examples: LaneState::Idle,
            quiz: None,
        }
    }

    //=====================================================================================
    // Accessors
    //=====================================================================================

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = profile;
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn in_flight(&self) -> Option<Feature> {
        self.in_flight
    }

    pub fn extraction(&self) -> &LaneState<String> {
        &self.extraction
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.extraction.success().map(String::as_str)
    }

    pub fn study_aid(&self) -> &LaneState<StudyAid> {
        &self.study_aid
    }

    pub fn aid_type(&self) -> Option<AidType> {
        self.aid_type
    }

    pub fn mind_map(&self) -> &LaneState<MindMapImage> {
        &self.mind_map
    }

    pub fn explanation(&self) -> &LaneState<String> {
        &self.explanation
    }

    pub fn examples(&self) -> &LaneState<String> {
        &self.examples
    }

    pub fn quiz(&self) -> Option<&QuizAttempt> {
        self.quiz.as_ref()
    }

    //=====================================================================================
    // Uploads
    //=====================================================================================

    /// Replaces the uploaded image and resets every derived state.
    /// Bumping the epoch here is what makes still-in-flight results
    /// for the previous image stale.
    pub fn upload_image(&mut self, image: UploadedImage) {
        self.image = Some(image);
        self.epoch += 1;
        self.in_flight = None;
        self.extraction = LaneState::Idle;
        self.clear_results();
    }

    fn clear_results(&mut self) {
        self.study_aid = LaneState::Idle;
        self.aid_type = None;
        self.mind_map = LaneState::Idle;
        self.explanation = LaneState::Idle;
        self.examples = LaneState::Idle;
        self.quiz = None;
    }

    //=====================================================================================
    // Request lifecycle
    //=====================================================================================

    fn take_token(&mut self, feature: Feature) -> WorkflowResult<RequestTicket> {
        if self.in_flight.is_some() {
            return Err(WorkflowError::RequestInFlight);
        }
        self.in_flight = Some(feature);
        Ok(RequestTicket {
            feature,
            epoch: self.epoch,
        })
    }

    fn is_stale(&self, ticket: &RequestTicket) -> bool {
        ticket.epoch != self.epoch
    }

    fn release(&mut self) {
        self.in_flight = None;
    }

    /// The extracted text all generation features depend on, or the
    /// precondition error when extraction has not succeeded yet.
    fn usable_text(&self) -> WorkflowResult<&str> {
        match self.extracted_text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(WorkflowError::Precondition(
                "extract text from an image successfully first".to_string(),
            )),
        }
    }

    /// Starts the extraction stage for the currently uploaded image.
    pub fn begin_extraction(&mut self) -> WorkflowResult<(RequestTicket, UploadedImage)> {
        if self.in_flight.is_some() {
            return Err(WorkflowError::RequestInFlight);
        }
        let image = self
            .image
            .clone()
            .ok_or_else(|| WorkflowError::Precondition("upload an image first".to_string()))?;

        let ticket = self.take_token(Feature::Extraction)?;
        self.extraction = LaneState::Loading;
        self.clear_results();
        Ok((ticket, image))
    }

    pub fn complete_extraction(
        &mut self,
        ticket: RequestTicket,
        result: WorkflowResult<String>,
    ) -> Completion {
        if self.is_stale(&ticket) {
            return Completion::Stale;
        }
        self.release();
        self.extraction = match result {
            Ok(text) => LaneState::Success(text),
            Err(error) => LaneState::Error(error),
        };
        Completion::Applied
    }

    /// Starts a study-aid generation for the given type.
    pub fn begin_aid(&mut self, aid_type: AidType) -> WorkflowResult<(RequestTicket, AidRequest)> {
        if self.in_flight.is_some() {
            return Err(WorkflowError::RequestInFlight);
        }
        let request = AidRequest {
            aid_type,
            extracted_text: self.usable_text()?.to_string(),
            profile: self.profile.clone(),
        };

        let ticket = self.take_token(Feature::StudyAid)?;
        self.clear_results();
        self.aid_type = Some(aid_type);
        self.study_aid = LaneState::Loading;
        Ok((ticket, request))
    }

    pub fn complete_aid(
        &mut self,
        ticket: RequestTicket,
        result: WorkflowResult<GeneratedAid>,
    ) -> AidCompletion {
        if self.is_stale(&ticket) {
            return AidCompletion::Stale;
        }

        match result {
            Ok(GeneratedAid {
                aid: StudyAid::MindMapDescription(description),
                ..
            }) => {
                // Hand off to the image stage: the generator lane goes
                // quiet before the second round trip starts.
                self.study_aid = LaneState::Idle;
                self.mind_map = LaneState::Loading;
                self.in_flight = Some(Feature::MindMapImage);
                AidCompletion::MindMapStage {
                    ticket: RequestTicket {
                        feature: Feature::MindMapImage,
                        epoch: ticket.epoch,
                    },
                    description,
                }
            }
            Ok(GeneratedAid { aid, prompt }) => {
                self.release();
                let history = self.image.as_ref().map(|image| {
                    HistoryRecord::new(
                        &image.file_name,
                        self.extracted_text().unwrap_or_default(),
                        &aid,
                        &self.profile,
                        &prompt,
                    )
                });
                if let StudyAid::Quiz(items) = &aid {
                    self.quiz = Some(QuizAttempt::new(items.len()));
                }
                self.study_aid = LaneState::Success(aid);
                AidCompletion::Applied { history }
            }
            Err(error) => {
                self.release();
                self.study_aid = LaneState::Error(error);
                AidCompletion::Applied { history: None }
            }
        }
    }

    pub fn complete_mind_map(
        &mut self,
        ticket: RequestTicket,
        result: WorkflowResult<MindMapImage>,
    ) -> Completion {
        if self.is_stale(&ticket) {
            return Completion::Stale;
        }
        self.release();
        self.mind_map = match result {
            Ok(image) => LaneState::Success(image),
            Err(error) => LaneState::Error(error),
        };
        Completion::Applied
    }

    /// Starts a concept explanation. The concept must be non-blank and
    /// extraction must have succeeded; both are checked before any
    /// network call is made.
    pub fn begin_explanation(
        &mut self,
        concept: &str,
    ) -> WorkflowResult<(RequestTicket, String, UserProfile)> {
        if self.in_flight.is_some() {
            return Err(WorkflowError::RequestInFlight);
        }
        let material = self.usable_text()?.to_string();
        if concept.trim().is_empty() {
            return Err(WorkflowError::Precondition(
                "enter a concept to explain".to_string(),
            ));
        }

        let profile = self.profile.clone();
        let ticket = self.take_token(Feature::Explanation)?;
        self.clear_results();
        self.explanation = LaneState::Loading;
        Ok((ticket, material, profile))
    }

    pub fn complete_explanation(
        &mut self,
        ticket: RequestTicket,
        result: WorkflowResult<String>,
    ) -> Completion {
        if self.is_stale(&ticket) {
            return Completion::Stale;
        }
        self.release();
        self.explanation = match result {
            Ok(text) => LaneState::Success(text),
            Err(error) => LaneState::Error(error),
        };
        Completion::Applied
    }

    /// Starts a practical-examples generation.
    pub fn begin_examples(&mut self) -> WorkflowResult<(RequestTicket, String, UserProfile)> {
        if self.in_flight.is_some() {
            return Err(WorkflowError::RequestInFlight);
        }
        let material = self.usable_text()?.to_string();

        let profile = self.profile.clone();
        let ticket = self.take_token(Feature::Examples)?;
        self.clear_results();
        self.examples = LaneState::Loading;
        Ok((ticket, material, profile))
    }

    pub fn complete_examples(
        &mut self,
        ticket: RequestTicket,
        result: WorkflowResult<String>,
    ) -> Completion {
        if self.is_stale(&ticket) {
            return Completion::Stale;
        }
        self.release();
        self.examples = match result {
            Ok(text) => LaneState::Success(text),
            Err(error) => LaneState::Error(error),
        };
        Completion::Applied
    }

    //=====================================================================================
    // Quiz answering (purely local)
    //=====================================================================================

    /// Records one answer against the active quiz. Local state only;
    /// never gated by the in-flight token.
    pub fn answer_quiz(
        &mut self,
        question_index: usize,
        chosen_index: usize,
    ) -> Result<AnswerFeedback, QuizAnswerError> {
        let questions = match &self.study_aid {
            LaneState::Success(StudyAid::Quiz(items)) => items,
            _ => return Err(QuizAnswerError::NoActiveQuiz),
        };
        let attempt = self.quiz.as_mut().ok_or(QuizAnswerError::NoActiveQuiz)?;
        attempt.answer(questions, question_index, chosen_index)
    }
}
