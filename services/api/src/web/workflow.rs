//! services/api/src/web/workflow.rs
//!
//! The asynchronous "worker" functions that drive one workflow request
//! each: stage the inputs under the session lock, perform the network
//! call with the lock released, and apply the completion (or drop it
//! as stale). History persistence happens here, after success, as a
//! best-effort hook that never fails the generation.

use crate::web::state::{AppState, SharedSession};
use study_spark_core::domain::{AidType, MindMapImage, StudyAid};
use study_spark_core::ports::{WorkflowError, WorkflowResult};
use study_spark_core::session::{AidCompletion, Completion};
use tracing::{info, warn};

/// How a driven request ended: applied to the session, or discarded
/// because a newer image upload superseded it mid-flight.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Applied(T),
    Stale,
}

/// The displayable result of a study-aid request.
#[derive(Debug, Clone, PartialEq)]
pub enum AidOutcome {
    Aid(StudyAid),
    MindMap(MindMapImage),
}

/// Runs the extraction stage for the session's uploaded image.
pub async fn run_extraction(
    app_state: &AppState,
    session_lock: &SharedSession,
) -> WorkflowResult<Outcome<String>> {
    let (ticket, image, language) = {
        let mut session = session_lock.lock().await;
        let (ticket, image) = session.begin_extraction()?;
        let language = session.profile().language;
        (ticket, image, language)
    };

    info!("Extracting text from '{}'", image.file_name);
    let result = app_state.extraction.extract_text(&image, language).await;

    let mut session = session_lock.lock().await;
    match session.complete_extraction(ticket, result.clone()) {
        Completion::Stale => {
            info!("Discarding extraction result from a superseded upload");
            Ok(Outcome::Stale)
        }
        Completion::Applied => result.map(Outcome::Applied),
    }
}

/// Runs one study-aid generation, chaining into the image stage for
/// the mind-map type.
pub async fn run_study_aid(
    app_state: &AppState,
    session_lock: &SharedSession,
    aid_type: AidType,
) -> WorkflowResult<Outcome<AidOutcome>> {
    let (ticket, request) = {
        let mut session = session_lock.lock().await;
        session.begin_aid(aid_type)?
    };

    info!("Generating '{}' study aid", aid_type);
    let generated = app_state.aids.generate_study_aid(&request).await;
    let generation_error = generated.as_ref().err().cloned();

    let mut session = session_lock.lock().await;
    match session.complete_aid(ticket, generated) {
        AidCompletion::Stale => {
            info!("Discarding '{}' result from a superseded upload", aid_type);
            Ok(Outcome::Stale)
        }
        AidCompletion::Applied { history } => {
            if let Some(error) = generation_error {
                return Err(error);
            }
            let aid = session
                .study_aid()
                .success()
                .cloned()
                .ok_or(WorkflowError::EmptyResponse)?;
            let user_id = session.user_id();
            drop(session);

            if let Some(record) = history {
                if let Err(e) = app_state.history.record(user_id, &record).await {
                    warn!("Failed to persist study-aid history for {}: {}", user_id, e);
                }
            }
            Ok(Outcome::Applied(AidOutcome::Aid(aid)))
        }
        AidCompletion::MindMapStage { ticket, description } => {
            drop(session);
            info!("Mind-map description ready, rendering image");
            let image_result = app_state.mind_map.render_mind_map(&description).await;
            let render_error = image_result.as_ref().err().cloned();

            let mut session = session_lock.lock().await;
            match session.complete_mind_map(ticket, image_result) {
                Completion::Stale => {
                    info!("Discarding mind-map image from a superseded upload");
                    Ok(Outcome::Stale)
                }
                Completion::Applied => {
                    if let Some(error) = render_error {
                        return Err(error);
                    }
                    let image = session
                        .mind_map()
                        .success()
                        .cloned()
                        .ok_or(WorkflowError::EmptyResponse)?;
                    Ok(Outcome::Applied(AidOutcome::MindMap(image)))
                }
            }
        }
    }
}

/// Runs one concept explanation.
pub async fn run_explanation(
    app_state: &AppState,
    session_lock: &SharedSession,
    concept: &str,
) -> WorkflowResult<Outcome<String>> {
    let (ticket, material, profile) = {
        let mut session = session_lock.lock().await;
        session.begin_explanation(concept)?
    };

    info!("Explaining concept '{}'", concept);
    let result = app_state
        .enrichment
        .explain_concept(&material, concept, &profile)
        .await;

    let mut session = session_lock.lock().await;
    match session.complete_explanation(ticket, result.clone()) {
        Completion::Stale => Ok(Outcome::Stale),
        Completion::Applied => result.map(Outcome::Applied),
    }
}

/// Runs one practical-examples generation.
pub async fn run_examples(
    app_state: &AppState,
    session_lock: &SharedSession,
) -> WorkflowResult<Outcome<String>> {
    let (ticket, material, profile) = {
        let mut session = session_lock.lock().await;
        session.begin_examples()?
    };

    info!("Generating practical examples");
    let result = app_state
        .enrichment
        .practical_examples(&material, &profile)
        .await;

    let mut session = session_lock.lock().await;
    match session.complete_examples(ticket, result.clone()) {
        Completion::Stale => Ok(Outcome::Stale),
        Completion::Applied => result.map(Outcome::Applied),
    }
}
