//! services/api/src/adapters/extraction_llm.rs
//!
//! This module contains the adapter for the vision-capable text
//! extraction stage. It implements the `TextExtractionService` port
//! from the `core` crate.

use crate::adapters::gemini::{GeminiClient, GenerateContentRequest, Part};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use study_spark_core::domain::{Language, UploadedImage};
use study_spark_core::ports::{TextExtractionService, WorkflowResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that extracts study-material text from an image through
/// the hosted vision endpoint.
#[derive(Clone)]
pub struct GeminiExtractionAdapter {
    client: GeminiClient,
}

impl GeminiExtractionAdapter {
    /// Creates a new `GeminiExtractionAdapter`.
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    fn instruction(language: Language) -> String {
        format!(
            "Extract the text from this image. The text is study material written in \
             '{}'. If you detect a table or a particular structure, try to keep it.",
            language.as_str()
        )
    }
}

//=========================================================================================
// `TextExtractionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextExtractionService for GeminiExtractionAdapter {
    /// Sends the image alongside the extraction instruction and returns
    /// the plain text the model read out of it.
    async fn extract_text(
        &self,
        image: &UploadedImage,
        language: Language,
    ) -> WorkflowResult<String> {
        let request = GenerateContentRequest::from_parts(vec![
            Part::text(Self::instruction(language)),
            Part::inline_data(image.mime_type.clone(), BASE64.encode(&image.data)),
        ]);

        self.client.generate(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_names_the_profile_language() {
        let instruction = GeminiExtractionAdapter::instruction(Language::Pt);
        assert!(instruction.contains("'pt'"));
        assert!(instruction.contains("keep it"));
    }
}
