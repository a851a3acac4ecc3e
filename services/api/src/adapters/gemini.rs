//! services/api/src/adapters/gemini.rs
//!
//! Shared wire types and HTTP client for the hosted text/vision
//! generation endpoint. The three LLM adapters build their prompts on
//! top of this client; it owns the request envelope, the response
//! envelope, and the mapping from envelope states to the workflow
//! error taxonomy.

use serde::{Deserialize, Serialize};
use study_spark_core::ports::{WorkflowError, WorkflowResult};

//=========================================================================================
// Request Envelope
//=========================================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// A single-turn request carrying the given parts.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { parts }],
            generation_config: None,
        }
    }

    /// Constrains the response to JSON conforming to `schema`.
    pub fn with_json_schema(mut self, schema: serde_json::Value) -> Self {
        self.generation_config = Some(GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: schema,
        });
        self
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: base64_data.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

//=========================================================================================
// Response Envelope
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
    pub block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

/// Maps a decoded success envelope to its candidate text.
///
/// A reported safety block always wins over "no candidates", so the
/// two failure modes stay distinguishable to the caller.
pub fn text_from_envelope(envelope: GenerateContentResponse) -> WorkflowResult<String> {
    if let Some(feedback) = envelope.prompt_feedback {
        if let Some(reason) = feedback.block_reason {
            return Err(WorkflowError::ContentBlocked {
                reason,
                message: feedback.block_reason_message,
            });
        }
    }

    envelope
        .candidates
        .into_iter()
        .flat_map(|candidate| candidate.content.map(|content| content.parts).unwrap_or_default())
        .find_map(|part| part.text)
        .filter(|text| !text.is_empty())
        .ok_or(WorkflowError::EmptyResponse)
}

/// Reads the provider-reported message out of a non-success body.
pub fn message_from_error_body(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .unwrap_or_else(|| format!("endpoint returned status {}", status))
}

//=========================================================================================
// The Shared Client
//=========================================================================================

/// A thin client for the `generateContent` endpoint, shared by every
/// text-generation adapter.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, base_url: String, model: String, api_key: String) -> Self {
        Self {
            http,
            base_url,
            model,
            api_key,
        }
    }

    /// Issues one generation call and returns the candidate text.
    pub async fn generate(&self, request: &GenerateContentRequest) -> WorkflowResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| WorkflowError::Transport {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkflowError::Transport {
                status: Some(status.as_u16()),
                message: message_from_error_body(status.as_u16(), &body),
            });
        }

        let envelope = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|_| WorkflowError::EmptyResponse)?;
        text_from_envelope(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_serialize_to_the_documented_wire_shape() {
        let request = GenerateContentRequest::from_parts(vec![
            Part::text("Extract the text"),
            Part::inline_data("image/png", "aGVsbG8="),
        ])
        .with_json_schema(serde_json::json!({ "type": "ARRAY" }));

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["contents"][0]["parts"][0]["text"], "Extract the text");
        assert_eq!(
            wire["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(
            wire["generationConfig"]["responseMimeType"],
            "application/json"
        );
        // Absent fields stay off the wire entirely.
        assert!(wire["contents"][0]["parts"][0].get("inlineData").is_none());
    }

    #[test]
    fn schemaless_requests_omit_the_generation_config() {
        let request = GenerateContentRequest::from_parts(vec![Part::text("hi")]);
        let wire = serde_json::to_value(&request).unwrap();
        assert!(wire.get("generationConfig").is_none());
    }

    #[test]
    fn candidate_text_is_returned_from_a_success_envelope() {
        let envelope: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"extracted text"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(text_from_envelope(envelope).unwrap(), "extracted text");
    }

    #[test]
    fn a_block_reason_maps_to_content_blocked_not_empty() {
        let envelope: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[],"promptFeedback":{"blockReason":"SAFETY","blockReasonMessage":"unsafe image"}}"#,
        )
        .unwrap();
        assert_eq!(
            text_from_envelope(envelope).unwrap_err(),
            WorkflowError::ContentBlocked {
                reason: "SAFETY".to_string(),
                message: Some("unsafe image".to_string()),
            }
        );
    }

    #[test]
    fn missing_candidates_map_to_empty_response() {
        let envelope: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(
            text_from_envelope(envelope).unwrap_err(),
            WorkflowError::EmptyResponse
        );

        let envelope: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap();
        assert_eq!(
            text_from_envelope(envelope).unwrap_err(),
            WorkflowError::EmptyResponse
        );
    }

    #[test]
    fn provider_error_messages_are_extracted_from_failure_bodies() {
        assert_eq!(
            message_from_error_body(400, r#"{"error":{"message":"API key not valid"}}"#),
            "API key not valid"
        );
        assert_eq!(
            message_from_error_body(500, "not json"),
            "endpoint returned status 500"
        );
    }
}
