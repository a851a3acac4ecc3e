//! services/api/src/adapters/aid_llm.rs
//!
//! This module contains the adapter for the study-aid generation
//! stage. It selects the per-type instruction template and, for the
//! structured types, the response schema; parses and validates the
//! structured responses; and implements the `StudyAidGenerationService`
//! port from the `core` crate.

use crate::adapters::gemini::{GeminiClient, GenerateContentRequest, Part};
use async_trait::async_trait;
use study_spark_core::domain::{
    AidRequest, AidType, FaqEntry, GeneratedAid, QuizQuestion, StudyAid, UserProfile,
};
use study_spark_core::ports::{StudyAidGenerationService, WorkflowError, WorkflowResult};
use study_spark_core::quiz::validate_quiz;

//=========================================================================================
// Prompt Templates and Response Schemas
//=========================================================================================

/// The shared preamble of every study-aid prompt.
fn base_prompt(profile: &UserProfile, material: &str) -> String {
    format!(
        "You are an expert study assistant. The user has a study level of '{}' and \
         prefers content in '{}'.\n\nSource study material:\n\"\"\"{}\"\"\"\n\n",
        profile.study_level.as_str(),
        profile.language.as_str(),
        material
    )
}

fn instruction_for(aid_type: AidType) -> &'static str {
    match aid_type {
        AidType::Summary => {
            "Please generate a concise and clear summary of this material, highlighting \
             the most important points."
        }
        AidType::Quiz => {
            "Create an interactive quiz of 5 multiple-choice questions (with 4 options \
             each, where only one is correct) based on the material. For each question, \
             clearly indicate which option is correct and provide a brief explanation of \
             why that answer is correct."
        }
        AidType::Faq => {
            "Generate a study guide in Frequently Asked Questions (FAQ) format. Create at \
             least 5-7 key questions a student might have about this material, together \
             with concise and clear answers."
        }
        AidType::MindMap => {
            "Describe in detail the structure and content of a mind map based on this \
             material. Identify the central concept, the main topics branching from it, \
             and the subtopics or key ideas for each main topic. Specify the \
             relationships between the concepts. This description will be used to \
             generate an image of the mind map, so be very specific about the hierarchy \
             and the connections."
        }
    }
}

/// The response schema declared for `quiz` requests.
fn quiz_response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "description": "An array of objects, each representing one quiz question.",
        "items": {
            "type": "OBJECT",
            "properties": {
                "question": { "type": "STRING", "description": "The quiz question." },
                "options": {
                    "type": "ARRAY",
                    "description": "An array of 4 strings representing the answer options.",
                    "items": { "type": "STRING" }
                },
                "correctAnswerIndex": {
                    "type": "INTEGER",
                    "description": "The index (0-3) of the correct option in the 'options' array."
                },
                "explanation": {
                    "type": "STRING",
                    "description": "A brief explanation of why the correct answer is correct."
                }
            },
            "required": ["question", "options", "correctAnswerIndex", "explanation"]
        }
    })
}

/// The response schema declared for `faq` requests.
fn faq_response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "description": "An array of objects, each representing one question and its answer.",
        "items": {
            "type": "OBJECT",
            "properties": {
                "question": { "type": "STRING", "description": "The study question." },
                "answer": { "type": "STRING", "description": "The answer to the question." }
            },
            "required": ["question", "answer"]
        }
    })
}

fn response_schema_for(aid_type: AidType) -> Option<serde_json::Value> {
    match aid_type {
        AidType::Quiz => Some(quiz_response_schema()),
        AidType::Faq => Some(faq_response_schema()),
        AidType::Summary | AidType::MindMap => None,
    }
}

//=========================================================================================
// Structured Response Parsing
//=========================================================================================

/// Turns the raw candidate text into the typed aid, enforcing the
/// structured shapes where one was requested.
fn parse_aid(aid_type: AidType, text: String) -> WorkflowResult<StudyAid> {
    match aid_type {
        AidType::Summary => Ok(StudyAid::Summary(text)),
        AidType::MindMap => Ok(StudyAid::MindMapDescription(text)),
        AidType::Quiz => {
            let items: Vec<QuizQuestion> = serde_json::from_str(&text)
                .map_err(|e| WorkflowError::SchemaValidation(e.to_string()))?;
            validate_quiz(&items).map_err(WorkflowError::SchemaValidation)?;
            Ok(StudyAid::Quiz(items))
        }
        AidType::Faq => {
            let entries: Vec<FaqEntry> = serde_json::from_str(&text)
                .map_err(|e| WorkflowError::SchemaValidation(e.to_string()))?;
            if entries.is_empty() {
                return Err(WorkflowError::SchemaValidation(
                    "faq contains no entries".to_string(),
                ));
            }
            Ok(StudyAid::Faq(entries))
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `StudyAidGenerationService` against the
/// hosted generation endpoint.
#[derive(Clone)]
pub struct GeminiAidAdapter {
    client: GeminiClient,
}

impl GeminiAidAdapter {
    /// Creates a new `GeminiAidAdapter`.
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

//=========================================================================================
// `StudyAidGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StudyAidGenerationService for GeminiAidAdapter {
    async fn generate_study_aid(&self, request: &AidRequest) -> WorkflowResult<GeneratedAid> {
        let prompt = format!(
            "{}{}",
            base_prompt(&request.profile, &request.extracted_text),
            instruction_for(request.aid_type)
        );

        let mut wire_request = GenerateContentRequest::from_parts(vec![Part::text(prompt.as_str())]);
        if let Some(schema) = response_schema_for(request.aid_type) {
            wire_request = wire_request.with_json_schema(schema);
        }

        let text = self.client.generate(&wire_request).await?;
        let aid = parse_aid(request.aid_type, text)?;
        Ok(GeneratedAid { aid, prompt })
    }
}
