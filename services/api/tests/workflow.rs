//! services/api/tests/workflow.rs
//!
//! End-to-end tests of the study-aid workflow, driven through the same
//! worker functions the HTTP handlers use, with mock implementations
//! of the core ports and an in-memory document store.

use api_lib::config::Config;
use api_lib::web::protocol::QuizAnswerResponse;
use api_lib::web::state::AppState;
use api_lib::web::workflow::{run_examples, run_explanation, run_extraction, run_study_aid};
use api_lib::web::workflow::{AidOutcome, Outcome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use study_spark_core::domain::{
    AidRequest, AidType, GeneratedAid, Language, MindMapImage, QuizQuestion, StudyAid,
    UploadedImage, UserProfile,
};
use study_spark_core::ports::{
    DocumentStore, EnrichmentService, MindMapImageService, StoreResult,
    StudyAidGenerationService, TextExtractionService, WorkflowError, WorkflowResult,
};
use study_spark_core::store::{history_path, profile_path};
use uuid::Uuid;

//=========================================================================================
// Mock Ports
//=========================================================================================

struct MockExtraction {
    response: WorkflowResult<String>,
    calls: AtomicUsize,
}

impl MockExtraction {
    fn new(response: WorkflowResult<String>) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextExtractionService for MockExtraction {
    async fn extract_text(
        &self,
        _image: &UploadedImage,
        _language: Language,
    ) -> WorkflowResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

struct MockAids {
    response: WorkflowResult<StudyAid>,
    calls: AtomicUsize,
}

impl MockAids {
    fn new(response: WorkflowResult<StudyAid>) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl StudyAidGenerationService for MockAids {
    async fn generate_study_aid(&self, request: &AidRequest) -> WorkflowResult<GeneratedAid> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map(|aid| GeneratedAid {
            aid,
            prompt: format!("test prompt for {}", request.aid_type),
        })
    }
}

struct MockEnrichment {
    response: WorkflowResult<String>,
    explain_calls: AtomicUsize,
    examples_calls: AtomicUsize,
}

impl MockEnrichment {
    fn new(response: WorkflowResult<String>) -> Arc<Self> {
        Arc::new(Self {
            response,
            explain_calls: AtomicUsize::new(0),
            examples_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl EnrichmentService for MockEnrichment {
    async fn explain_concept(
        &self,
        _material: &str,
        _concept: &str,
        _profile: &UserProfile,
    ) -> WorkflowResult<String> {
        self.explain_calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }

    async fn practical_examples(
        &self,
        _material: &str,
        _profile: &UserProfile,
    ) -> WorkflowResult<String> {
        self.examples_calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

struct MockMindMap {
    response: WorkflowResult<MindMapImage>,
    calls: AtomicUsize,
}

impl MockMindMap {
    fn new(response: WorkflowResult<MindMapImage>) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl MindMapImageService for MockMindMap {
    async fn render_mind_map(&self, _description: &str) -> WorkflowResult<MindMapImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

#[derive(Default)]
struct MemoryStore {
    documents: Mutex<HashMap<String, serde_json::Value>>,
    collections: Mutex<HashMap<String, Vec<serde_json::Value>>>,
}

impl MemoryStore {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn collection(&self, path: &str) -> Vec<serde_json::Value> {
        self.collections
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    fn document(&self, path: &str) -> Option<serde_json::Value> {
        self.documents.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> StoreResult<Option<serde_json::Value>> {
        Ok(self.document(path))
    }

    async fn set(&self, path: &str, value: serde_json::Value, merge: bool) -> StoreResult<()> {
        let mut documents = self.documents.lock().unwrap();
        match documents.get_mut(path) {
            Some(existing) if merge => {
                if let (Some(target), Some(incoming)) =
                    (existing.as_object_mut(), value.as_object())
                {
                    for (key, field) in incoming {
                        target.insert(key.clone(), field.clone());
                    }
                } else {
                    *existing = value;
                }
            }
            _ => {
                documents.insert(path.to_string(), value);
            }
        }
        Ok(())
    }

    async fn append(
        &self,
        collection_path: &str,
        value: serde_json::Value,
    ) -> StoreResult<String> {
        let mut collections = self.collections.lock().unwrap();
        let entries = collections.entry(collection_path.to_string()).or_default();
        entries.push(value);
        Ok(format!("{}", entries.len()))
    }
}

//=========================================================================================
// Fixture
//=========================================================================================

const APP_ID: &str = "study-spark-test";

fn test_config() -> Arc<Config> {
    Arc::new(Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        log_level: tracing::Level::INFO,
        google_ai_api_key: "test-key".to_string(),
        generation_base_url: "http://localhost:0".to_string(),
        generation_model: "gemini-2.0-flash".to_string(),
        image_model: "imagen-3.0-generate-002".to_string(),
        store_base_url: "http://localhost:0".to_string(),
        app_id: APP_ID.to_string(),
    })
}

fn app_state(
    extraction: Arc<MockExtraction>,
    aids: Arc<MockAids>,
    enrichment: Arc<MockEnrichment>,
    mind_map: Arc<MockMindMap>,
    store: Arc<MemoryStore>,
) -> Arc<AppState> {
    Arc::new(AppState::new(
        test_config(),
        extraction,
        aids,
        enrichment,
        mind_map,
        store,
    ))
}

fn leaf_image() -> UploadedImage {
    UploadedImage {
        file_name: "leaf.png".to_string(),
        mime_type: "image/png".to_string(),
        data: vec![0x89, 0x50, 0x4e, 0x47],
    }
}

fn sample_quiz() -> Vec<QuizQuestion> {
    (0..5)
        .map(|i| QuizQuestion {
            question: format!("Question {}", i),
            options: vec![
                "Option A".to_string(),
                "Option B".to_string(),
                "Option C".to_string(),
                "Option D".to_string(),
            ],
            correct_answer_index: 1,
            explanation: "Because of the material.".to_string(),
        })
        .collect()
}

//=========================================================================================
// Scenarios
//=========================================================================================

#[tokio::test]
async fn scenario_a_summary_is_generated_and_recorded_in_history() {
    let extraction = MockExtraction::new(Ok(
        "Photosynthesis converts light into chemical energy.".to_string(),
    ));
    let aids = MockAids::new(Ok(StudyAid::Summary(
        "Plants turn light into chemical energy.".to_string(),
    )));
    let enrichment = MockEnrichment::new(Ok(String::new()));
    let mind_map = MockMindMap::new(Err(WorkflowError::EmptyResponse));
    let store = MemoryStore::new();
    let state = app_state(extraction, aids, enrichment, mind_map, store.clone());

    let user_id = Uuid::new_v4();
    let session = state.session(user_id).await.unwrap();
    session.lock().await.upload_image(leaf_image());

    let extracted = run_extraction(&state, &session).await.unwrap();
    assert_eq!(
        extracted,
        Outcome::Applied("Photosynthesis converts light into chemical energy.".to_string())
    );

    let outcome = run_study_aid(&state, &session, AidType::Summary)
        .await
        .unwrap();
    match outcome {
        Outcome::Applied(AidOutcome::Aid(StudyAid::Summary(text))) => {
            assert_eq!(text, "Plants turn light into chemical energy.");
        }
        other => panic!("expected a summary, got {:?}", other),
    }

    let history = store.collection(&history_path(APP_ID, user_id));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["aidType"], "summary");
    assert_eq!(history[0]["originalImageName"], "leaf.png");
    assert_eq!(
        history[0]["extractedText"],
        "Photosynthesis converts light into chemical energy."
    );
    assert_eq!(history[0]["promptUsed"], "test prompt for summary");
    assert_eq!(history[0]["studyLevel"], "university");
}

#[tokio::test]
async fn scenario_b_a_full_quiz_attempt_scores_three_of_five() {
    let extraction = MockExtraction::new(Ok("The water cycle.".to_string()));
    let aids = MockAids::new(Ok(StudyAid::Quiz(sample_quiz())));
    let enrichment = MockEnrichment::new(Ok(String::new()));
    let mind_map = MockMindMap::new(Err(WorkflowError::EmptyResponse));
    let store = MemoryStore::new();
    let state = app_state(extraction, aids, enrichment, mind_map, store);

    let session = state.session(Uuid::new_v4()).await.unwrap();
    session.lock().await.upload_image(leaf_image());
    run_extraction(&state, &session).await.unwrap();

    let outcome = run_study_aid(&state, &session, AidType::Quiz).await.unwrap();
    assert!(matches!(
        outcome,
        Outcome::Applied(AidOutcome::Aid(StudyAid::Quiz(_)))
    ));

    // Three correct answers (option 1) and two wrong ones.
    let choices = [1usize, 1, 0, 1, 3];
    let mut last = None;
    for (question_index, option_index) in choices.into_iter().enumerate() {
        let feedback = session
            .lock()
            .await
            .answer_quiz(question_index, option_index)
            .unwrap();
        last = Some(feedback);
    }

    let feedback = last.unwrap();
    assert!(feedback.completed);
    assert_eq!(feedback.score, 3);
    assert_eq!(feedback.total, 5);

    let response = QuizAnswerResponse::from(feedback);
    assert_eq!(response.score_display, "3 / 5");
}

#[tokio::test]
async fn scenario_c_a_failed_image_stage_is_typed_and_unrecorded() {
    let extraction = MockExtraction::new(Ok("Cells and organelles.".to_string()));
    let aids = MockAids::new(Ok(StudyAid::MindMapDescription(
        "Central concept: the cell.".to_string(),
    )));
    let enrichment = MockEnrichment::new(Ok(String::new()));
    // The image endpoint answers 200 with no predictions.
    let mind_map = MockMindMap::new(Err(WorkflowError::EmptyResponse));
    let store = MemoryStore::new();
    let state = app_state(extraction, aids, enrichment, mind_map.clone(), store.clone());

    let user_id = Uuid::new_v4();
    let session = state.session(user_id).await.unwrap();
    session.lock().await.upload_image(leaf_image());
    run_extraction(&state, &session).await.unwrap();

    let error = run_study_aid(&state, &session, AidType::MindMap)
        .await
        .unwrap_err();
    assert_eq!(error, WorkflowError::EmptyResponse);
    assert_eq!(mind_map.calls.load(Ordering::SeqCst), 1);

    let session = session.lock().await;
    assert_eq!(
        session.mind_map().error(),
        Some(&WorkflowError::EmptyResponse)
    );
    // The description stage finished, so the generator lane is quiet.
    assert!(session.study_aid().is_idle());
    drop(session);

    // No history entry is written for an image that never existed.
    assert!(store.collection(&history_path(APP_ID, user_id)).is_empty());
}

#[tokio::test]
async fn mind_map_happy_path_yields_an_image_without_history() {
    let extraction = MockExtraction::new(Ok("Cells.".to_string()));
    let aids = MockAids::new(Ok(StudyAid::MindMapDescription("Central: cell.".to_string())));
    let enrichment = MockEnrichment::new(Ok(String::new()));
    let mind_map = MockMindMap::new(Ok(MindMapImage {
        mime_type: "image/png".to_string(),
        data: vec![1, 2, 3],
    }));
    let store = MemoryStore::new();
    let state = app_state(extraction, aids, enrichment, mind_map, store.clone());

    let user_id = Uuid::new_v4();
    let session = state.session(user_id).await.unwrap();
    session.lock().await.upload_image(leaf_image());
    run_extraction(&state, &session).await.unwrap();

    let outcome = run_study_aid(&state, &session, AidType::MindMap)
        .await
        .unwrap();
    match outcome {
        Outcome::Applied(AidOutcome::MindMap(image)) => assert_eq!(image.data, vec![1, 2, 3]),
        other => panic!("expected a mind-map image, got {:?}", other),
    }
    assert!(store.collection(&history_path(APP_ID, user_id)).is_empty());
}

//=========================================================================================
// Precondition Gating
//=========================================================================================

#[tokio::test]
async fn missing_extraction_blocks_every_generation_without_a_network_call() {
    let extraction = MockExtraction::new(Ok("unused".to_string()));
    let aids = MockAids::new(Ok(StudyAid::Summary("unused".to_string())));
    let enrichment = MockEnrichment::new(Ok("unused".to_string()));
    let mind_map = MockMindMap::new(Err(WorkflowError::EmptyResponse));
    let store = MemoryStore::new();
    let state = app_state(
        extraction,
        aids.clone(),
        enrichment.clone(),
        mind_map.clone(),
        store,
    );

    let session = state.session(Uuid::new_v4()).await.unwrap();
    session.lock().await.upload_image(leaf_image());
    // No extraction has run.

    for aid_type in [AidType::Summary, AidType::Quiz, AidType::Faq, AidType::MindMap] {
        let error = run_study_aid(&state, &session, aid_type).await.unwrap_err();
        assert!(matches!(error, WorkflowError::Precondition(_)));
    }
    let error = run_explanation(&state, &session, "osmosis").await.unwrap_err();
    assert!(matches!(error, WorkflowError::Precondition(_)));
    let error = run_examples(&state, &session).await.unwrap_err();
    assert!(matches!(error, WorkflowError::Precondition(_)));

    assert_eq!(aids.calls.load(Ordering::SeqCst), 0);
    assert_eq!(enrichment.explain_calls.load(Ordering::SeqCst), 0);
    assert_eq!(enrichment.examples_calls.load(Ordering::SeqCst), 0);
    assert_eq!(mind_map.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_extraction_keeps_generation_blocked() {
    let extraction = MockExtraction::new(Err(WorkflowError::ContentBlocked {
        reason: "SAFETY".to_string(),
        message: None,
    }));
    let aids = MockAids::new(Ok(StudyAid::Summary("unused".to_string())));
    let enrichment = MockEnrichment::new(Ok("unused".to_string()));
    let mind_map = MockMindMap::new(Err(WorkflowError::EmptyResponse));
    let store = MemoryStore::new();
    let state = app_state(extraction, aids.clone(), enrichment, mind_map, store);

    let session = state.session(Uuid::new_v4()).await.unwrap();
    session.lock().await.upload_image(leaf_image());

    let error = run_extraction(&state, &session).await.unwrap_err();
    assert!(matches!(error, WorkflowError::ContentBlocked { .. }));

    let error = run_study_aid(&state, &session, AidType::Summary)
        .await
        .unwrap_err();
    assert!(matches!(error, WorkflowError::Precondition(_)));
    assert_eq!(aids.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn a_blank_concept_is_rejected_before_the_adapter_runs() {
    let extraction = MockExtraction::new(Ok("Material.".to_string()));
    let aids = MockAids::new(Ok(StudyAid::Summary("unused".to_string())));
    let enrichment = MockEnrichment::new(Ok("unused".to_string()));
    let mind_map = MockMindMap::new(Err(WorkflowError::EmptyResponse));
    let store = MemoryStore::new();
    let state = app_state(extraction, aids, enrichment.clone(), mind_map, store);

    let session = state.session(Uuid::new_v4()).await.unwrap();
    session.lock().await.upload_image(leaf_image());
    run_extraction(&state, &session).await.unwrap();

    let error = run_explanation(&state, &session, "   ").await.unwrap_err();
    assert!(matches!(error, WorkflowError::Precondition(_)));
    assert_eq!(enrichment.explain_calls.load(Ordering::SeqCst), 0);
}

//=========================================================================================
// Error Surfacing and History Policy
//=========================================================================================

#[tokio::test]
async fn a_schema_invalid_quiz_surfaces_as_schema_validation_without_history() {
    let extraction = MockExtraction::new(Ok("Material.".to_string()));
    let aids = MockAids::new(Err(WorkflowError::SchemaValidation(
        "question 0 has 3 options, expected 4".to_string(),
    )));
    let enrichment = MockEnrichment::new(Ok(String::new()));
    let mind_map = MockMindMap::new(Err(WorkflowError::EmptyResponse));
    let store = MemoryStore::new();
    let state = app_state(extraction, aids, enrichment, mind_map, store.clone());

    let user_id = Uuid::new_v4();
    let session = state.session(user_id).await.unwrap();
    session.lock().await.upload_image(leaf_image());
    run_extraction(&state, &session).await.unwrap();

    let error = run_study_aid(&state, &session, AidType::Quiz).await.unwrap_err();
    assert!(matches!(error, WorkflowError::SchemaValidation(_)));
    assert!(store.collection(&history_path(APP_ID, user_id)).is_empty());

    // The error also lands in the lane for the session snapshot.
    assert!(matches!(
        session.lock().await.study_aid().error(),
        Some(WorkflowError::SchemaValidation(_))
    ));
}

#[tokio::test]
async fn enrichment_results_land_in_their_own_lanes() {
    let extraction = MockExtraction::new(Ok("Material.".to_string()));
    let aids = MockAids::new(Ok(StudyAid::Summary("unused".to_string())));
    let enrichment = MockEnrichment::new(Ok("A clear explanation.".to_string()));
    let mind_map = MockMindMap::new(Err(WorkflowError::EmptyResponse));
    let store = MemoryStore::new();
    let state = app_state(extraction, aids, enrichment, mind_map, store.clone());

    let user_id = Uuid::new_v4();
    let session = state.session(user_id).await.unwrap();
    session.lock().await.upload_image(leaf_image());
    run_extraction(&state, &session).await.unwrap();

    let outcome = run_explanation(&state, &session, "osmosis").await.unwrap();
    assert_eq!(outcome, Outcome::Applied("A clear explanation.".to_string()));

    let outcome = run_examples(&state, &session).await.unwrap();
    assert_eq!(outcome, Outcome::Applied("A clear explanation.".to_string()));

    // Enrichment calls never write history.
    assert!(store.collection(&history_path(APP_ID, user_id)).is_empty());

    // Starting examples cleared the explanation lane.
    let session = session.lock().await;
    assert!(session.explanation().is_idle());
    assert!(session.examples().success().is_some());
}

//=========================================================================================
// Profile Store
//=========================================================================================

#[tokio::test]
async fn first_contact_initializes_the_default_profile_in_the_store() {
    let extraction = MockExtraction::new(Ok(String::new()));
    let aids = MockAids::new(Ok(StudyAid::Summary(String::new())));
    let enrichment = MockEnrichment::new(Ok(String::new()));
    let mind_map = MockMindMap::new(Err(WorkflowError::EmptyResponse));
    let store = MemoryStore::new();
    let state = app_state(extraction, aids, enrichment, mind_map, store.clone());

    let user_id = Uuid::new_v4();
    let session = state.session(user_id).await.unwrap();
    assert_eq!(*session.lock().await.profile(), UserProfile::default());

    let stored = store.document(&profile_path(APP_ID, user_id)).unwrap();
    assert_eq!(stored["studyLevel"], "university");
    assert_eq!(stored["language"], "es");
}
