//! services/api/src/adapters/mindmap_image.rs
//!
//! This module contains the adapter for the image-generation endpoint
//! used by the mind-map flow. It implements the `MindMapImageService`
//! port from the `core` crate.

use crate::adapters::gemini::message_from_error_body;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use study_spark_core::domain::MindMapImage;
use study_spark_core::ports::{MindMapImageService, WorkflowError, WorkflowResult};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Serialize)]
pub struct PredictRequest {
    pub instances: Vec<Instance>,
    pub parameters: Parameters,
}

#[derive(Debug, Serialize)]
pub struct Instance {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    pub sample_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub bytes_base64_encoded: Option<String>,
}

/// Decodes the first prediction of a success envelope into image bytes.
fn image_from_envelope(envelope: PredictResponse) -> WorkflowResult<MindMapImage> {
    let encoded = envelope
        .predictions
        .into_iter()
        .find_map(|prediction| prediction.bytes_base64_encoded)
        .ok_or(WorkflowError::EmptyResponse)?;

    let data = BASE64
        .decode(encoded.as_bytes())
        .map_err(|_| WorkflowError::EmptyResponse)?;
    Ok(MindMapImage {
        mime_type: "image/png".to_string(),
        data,
    })
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that renders a mind-map image from a textual description
/// through the hosted image-generation endpoint.
#[derive(Clone)]
pub struct ImagenMindMapAdapter {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl ImagenMindMapAdapter {
    /// Creates a new `ImagenMindMapAdapter`.
    pub fn new(http: reqwest::Client, base_url: String, model: String, api_key: String) -> Self {
        Self {
            http,
            base_url,
            model,
            api_key,
        }
    }

    fn instruction(description: &str) -> String {
        format!(
            "Generate an image of a mind map that visually represents the following \
             description. Try to make it clear, organized and visually appealing. \
             Description: \"{}\"",
            description
        )
    }
}

//=========================================================================================
// `MindMapImageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl MindMapImageService for ImagenMindMapAdapter {
    /// Requests exactly one sample image for the given description.
    async fn render_mind_map(&self, description: &str) -> WorkflowResult<MindMapImage> {
        let request = PredictRequest {
            instances: vec![Instance {
                prompt: Self::instruction(description),
            }],
            parameters: Parameters { sample_count: 1 },
        };

        let url = format!(
            "{}/models/{}:predict?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&request)
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
            .json::<PredictResponse>()
            .await
            .map_err(|_| WorkflowError::EmptyResponse)?;
        image_from_envelope(envelope)
    }
}
