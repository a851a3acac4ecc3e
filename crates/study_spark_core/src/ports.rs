//! crates/study_spark_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the hosted
//! generation endpoints or the document store.

use async_trait::async_trait;
use crate::domain::{
    AidRequest, GeneratedAid, Language, MindMapImage, UploadedImage, UserProfile,
};

//=========================================================================================
// Workflow Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every generation stage.
///
/// Error state is always carried here, never inside a success payload's
/// text, so callers can branch on kind instead of sniffing strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// A required input was missing; raised before any network call.
    #[error("Missing required input: {0}")]
    Precondition(String),

    /// Another workflow request for this session is still outstanding.
    #[error("Another request is already in flight for this session")]
    RequestInFlight,

    /// The endpoint could not be reached (`status: None`) or answered
    /// with a non-success status.
    #[error("Generation endpoint failure (status {status:?}): {message}")]
    Transport { status: Option<u16>, message: String },

    /// The endpoint reported a content-safety block. Kept distinct from
    /// an empty response so the block reason reaches the user.
    #[error("Request blocked by the provider: {reason}")]
    ContentBlocked { reason: String, message: Option<String> },

    /// Success status, but the response carried no usable content.
    #[error("The endpoint returned no usable content")]
    EmptyResponse,

    /// A structured response was requested but did not parse or
    /// validate against the expected shape.
    #[error("Response did not match the expected shape: {0}")]
    SchemaValidation(String),
}

/// A convenience type alias for `Result<T, WorkflowError>`.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

//=========================================================================================
// Document Store Error and Result Types
//=========================================================================================

/// Errors from the generic key-path document store. Persistence
/// failures never surface as generation failures; callers log them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Transport(String),
    #[error("Store returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Stored document could not be decoded: {0}")]
    Serialization(String),
}

/// A convenience type alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait TextExtractionService: Send + Sync {
    /// Extracts the study-material text from an uploaded image.
    async fn extract_text(
        &self,
        image: &UploadedImage,
        language: Language,
    ) -> WorkflowResult<String>;
}

#[async_trait]
pub trait StudyAidGenerationService: Send + Sync {
    /// Generates the requested study aid from previously extracted text.
    ///
    /// For the structured aid types the implementation must return
    /// `SchemaValidation` when the response does not parse against the
    /// declared shape, never a silently accepted partial result.
    async fn generate_study_aid(&self, request: &AidRequest) -> WorkflowResult<GeneratedAid>;
}

#[async_trait]
pub trait EnrichmentService: Send + Sync {
    /// Explains one user-chosen concept against the extracted material.
    async fn explain_concept(
        &self,
        material: &str,
        concept: &str,
        profile: &UserProfile,
    ) -> WorkflowResult<String>;

    /// Produces 2-3 real-world applications of the material's key concepts.
    async fn practical_examples(
        &self,
        material: &str,
        profile: &UserProfile,
    ) -> WorkflowResult<String>;
}

#[async_trait]
pub trait MindMapImageService: Send + Sync {
    /// Renders a mind-map image from a textual description produced by
    /// the study-aid generator.
    async fn render_mind_map(&self, description: &str) -> WorkflowResult<MindMapImage>;
}

/// The narrow key-path interface of the hosted document store. Paths
/// are namespaced by application id and user id; the engine behind
/// them is an external collaborator.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the document at `path`, or `None` when it does not exist.
    async fn get(&self, path: &str) -> StoreResult<Option<serde_json::Value>>;

    /// Writes the document at `path`. With `merge` set, fields absent
    /// from `value` are preserved.
    async fn set(&self, path: &str, value: serde_json::Value, merge: bool) -> StoreResult<()>;

    /// Appends a new document to the collection at `collection_path`,
    /// returning the id assigned by the store.
    async fn append(&self, collection_path: &str, value: serde_json::Value)
        -> StoreResult<String>;
}
