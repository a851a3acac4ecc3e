pub mod domain;
pub mod lane;
pub mod ports;
pub mod quiz;
pub mod session;
pub mod store;

pub use domain::{
    AidRequest, AidType, FaqEntry, GeneratedAid, HistoryRecord, Language, MindMapImage,
    QuizQuestion, StudyAid, StudyLevel, UploadedImage, UserProfile,
};
pub use lane::{Feature, LaneState};
pub use ports::{
    DocumentStore, EnrichmentService, MindMapImageService, StoreError, StoreResult,
    StudyAidGenerationService, TextExtractionService, WorkflowError, WorkflowResult,
};
pub use quiz::{AnswerFeedback, QuizAnswerError, QuizAttempt};
pub use session::{AidCompletion, Completion, RequestTicket, StudySession};
pub use store::{HistoryLog, ProfileStore};
