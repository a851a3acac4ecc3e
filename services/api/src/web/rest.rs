//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    AidView, ExplainRequest, ExtractionResponse, QuizAnswerRequest, QuizAnswerResponse,
    SessionView, TextResponse, UploadResponse,
};
use crate::web::state::{AppState, SharedSession};
use crate::web::workflow::{self, Outcome};
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use std::str::FromStr;
use std::sync::Arc;
use study_spark_core::domain::{AidType, UploadedImage, UserProfile};
use study_spark_core::ports::WorkflowError;
use study_spark_core::quiz::QuizAnswerError;
use tracing::error;
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        upload_image_handler,
        quiz_answer_handler,
    ),
    components(
        schemas(UploadResponse, QuizAnswerRequest, QuizAnswerResponse, ExplainRequest)
    ),
    tags(
        (name = "StudySpark API", description = "API endpoints for the study-aid generation workflow.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Handler Helpers
//=========================================================================================

type HandlerError = (StatusCode, String);

fn user_id_from(headers: &HeaderMap) -> Result<Uuid, HandlerError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "x-user-id header is required".to_string(),
            )
        })?;
    Uuid::parse_str(raw)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid x-user-id format".to_string()))
}

async fn session_for(
    app_state: &AppState,
    headers: &HeaderMap,
) -> Result<(Uuid, SharedSession), HandlerError> {
    let user_id = user_id_from(headers)?;
    let session = app_state.session(user_id).await.map_err(|e| {
        error!("Failed to load session for {}: {}", user_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load user session".to_string(),
        )
    })?;
    Ok((user_id, session))
}

/// Maps a workflow error to the status its kind deserves. The message
/// always reaches the client; the taxonomy decides the code.
fn workflow_error_response(error: WorkflowError) -> HandlerError {
    let status = match &error {
        WorkflowError::Precondition(_) => StatusCode::BAD_REQUEST,
        WorkflowError::RequestInFlight => StatusCode::CONFLICT,
        WorkflowError::ContentBlocked { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::Transport { .. }
        | WorkflowError::EmptyResponse
        | WorkflowError::SchemaValidation(_) => StatusCode::BAD_GATEWAY,
    };
    (status, error.to_string())
}

fn stale_response() -> HandlerError {
    (
        StatusCode::CONFLICT,
        "The request was superseded by a newer image upload".to_string(),
    )
}

fn quiz_error_response(error: QuizAnswerError) -> HandlerError {
    let status = match &error {
        QuizAnswerError::NoActiveQuiz | QuizAnswerError::AlreadyAnswered(_) => {
            StatusCode::CONFLICT
        }
        QuizAnswerError::UnknownQuestion(_) | QuizAnswerError::InvalidOption(_) => {
            StatusCode::BAD_REQUEST
        }
    };
    (status, error.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Upload a new study-material image.
///
/// Accepts a multipart/form-data request with a single image part and
/// resets the session: any previous extraction, study aid, or quiz
/// attempt is discarded.
#[utoipa::path(
    post,
    path = "/session/image",
    request_body(content_type = "multipart/form-data", description = "The image to upload."),
    responses(
        (status = 201, description = "Image accepted", body = UploadResponse),
        (status = 400, description = "Bad request (e.g., missing header or non-image file)"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn upload_image_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let (_, session) = session_for(&app_state, &headers).await?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart data: {}", e),
            )
        })?
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "Multipart form must include an image file".to_string(),
            )
        })?;

    let file_name = field.file_name().unwrap_or("unknown").to_string();
    let mime_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    if !mime_type.starts_with("image/") {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Expected an image upload, got '{}'", mime_type),
        ));
    }
    let data = field.bytes().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read file bytes: {}", e),
        )
    })?;

    let image = UploadedImage {
        file_name: file_name.clone(),
        mime_type,
        data: data.to_vec(),
    };
    let size_bytes = image.data.len();
    session.lock().await.upload_image(image);

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file_name,
            size_bytes,
        }),
    ))
}

/// Extract the study-material text from the uploaded image.
pub async fn extract_text_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let (_, session) = session_for(&app_state, &headers).await?;

    match workflow::run_extraction(&app_state, &session).await {
        Ok(Outcome::Applied(text)) => Ok(Json(ExtractionResponse { text })),
        Ok(Outcome::Stale) => Err(stale_response()),
        Err(error) => Err(workflow_error_response(error)),
    }
}

/// Generate one study aid of the requested type.
pub async fn generate_aid_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(aid_type): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let aid_type = AidType::from_str(&aid_type)
        .map_err(|message| (StatusCode::BAD_REQUEST, message))?;
    let (_, session) = session_for(&app_state, &headers).await?;

    match workflow::run_study_aid(&app_state, &session, aid_type).await {
        Ok(Outcome::Applied(outcome)) => Ok(Json(AidView::from(outcome))),
        Ok(Outcome::Stale) => Err(stale_response()),
        Err(error) => Err(workflow_error_response(error)),
    }
}

/// Explain one concept from the extracted material.
pub async fn explain_concept_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ExplainRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let (_, session) = session_for(&app_state, &headers).await?;

    match workflow::run_explanation(&app_state, &session, &request.concept).await {
        Ok(Outcome::Applied(text)) => Ok(Json(TextResponse { text })),
        Ok(Outcome::Stale) => Err(stale_response()),
        Err(error) => Err(workflow_error_response(error)),
    }
}

/// Generate practical examples from the extracted material.
pub async fn practical_examples_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let (_, session) = session_for(&app_state, &headers).await?;

    match workflow::run_examples(&app_state, &session).await {
        Ok(Outcome::Applied(text)) => Ok(Json(TextResponse { text })),
        Ok(Outcome::Stale) => Err(stale_response()),
        Err(error) => Err(workflow_error_response(error)),
    }
}

/// Answer one question of the active quiz.
///
/// Purely local: no generation call is involved, and a question can
/// only be answered once.
#[utoipa::path(
    post,
    path = "/session/quiz/answers",
    request_body = QuizAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = QuizAnswerResponse),
        (status = 400, description = "Unknown question or option"),
        (status = 409, description = "No active quiz, or question already answered")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn quiz_answer_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<QuizAnswerRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let (_, session) = session_for(&app_state, &headers).await?;

    let feedback = session
        .lock()
        .await
        .answer_quiz(request.question_index, request.option_index)
        .map_err(quiz_error_response)?;
    Ok(Json(QuizAnswerResponse::from(feedback)))
}

/// Read the user's study profile.
pub async fn get_profile_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let (_, session) = session_for(&app_state, &headers).await?;
    let profile = session.lock().await.profile().clone();
    Ok(Json(profile))
}

/// Save the user's study profile.
pub async fn save_profile_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(profile): Json<UserProfile>,
) -> Result<impl IntoResponse, HandlerError> {
    let (user_id, session) = session_for(&app_state, &headers).await?;

    app_state.profiles.save(user_id, &profile).await.map_err(|e| {
        error!("Failed to save profile for {}: {}", user_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save profile".to_string(),
        )
    })?;
    session.lock().await.set_profile(profile.clone());
    Ok(Json(profile))
}

/// Read a snapshot of the session's lanes and quiz progress.
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let (_, session) = session_for(&app_state, &headers).await?;
    let view = SessionView::from_session(&*session.lock().await);
    Ok(Json(view))
}
