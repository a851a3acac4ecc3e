//! services/api/src/adapters/enrichment_llm.rs
//!
//! This module contains the adapter for the two single-shot enrichment
//! calls: explaining one user-chosen concept and generating practical
//! examples. It implements the `EnrichmentService` port from the
//! `core` crate.

use crate::adapters::gemini::{GeminiClient, GenerateContentRequest, Part};
use async_trait::async_trait;
use study_spark_core::domain::UserProfile;
use study_spark_core::ports::{EnrichmentService, WorkflowResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `EnrichmentService` against the hosted
/// generation endpoint.
#[derive(Clone)]
pub struct GeminiEnrichmentAdapter {
    client: GeminiClient,
}

impl GeminiEnrichmentAdapter {
    /// Creates a new `GeminiEnrichmentAdapter`.
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    fn explanation_prompt(material: &str, concept: &str, profile: &UserProfile) -> String {
        format!(
            "You are an expert teacher. Based on the following study material, explain \
             the key concept \"{concept}\" clearly and concisely. Adapt the explanation \
             to a '{level}' study level and write it in '{language}'.\n\n\
             Study material:\n\"\"\"{material}\"\"\"\n\n\
             Explanation of the concept \"{concept}\":",
            concept = concept,
            level = profile.study_level.as_str(),
            language = profile.language.as_str(),
            material = material,
        )
    }

    fn examples_prompt(material: &str, profile: &UserProfile) -> String {
        format!(
            "You are a creative educator. Based on the following study material, generate \
             2-3 practical examples or real-world applications of the main concepts \
             discussed. Make the examples relevant for a '{level}' study level and write \
             them in '{language}'.\n\n\
             Study material:\n\"\"\"{material}\"\"\"\n\n\
             Practical examples:",
            level = profile.study_level.as_str(),
            language = profile.language.as_str(),
            material = material,
        )
    }
}

//=========================================================================================
// `EnrichmentService` Trait Implementation
//=========================================================================================

#[async_trait]
impl EnrichmentService for GeminiEnrichmentAdapter {
    async fn explain_concept(
        &self,
        material: &str,
        concept: &str,
        profile: &UserProfile,
    ) -> WorkflowResult<String> {
        let prompt = Self::explanation_prompt(material, concept, profile);
        let request = GenerateContentRequest::from_parts(vec![Part::text(prompt)]);
        self.client.generate(&request).await
    }

    async fn practical_examples(
        &self,
        material: &str,
        profile: &UserProfile,
    ) -> WorkflowResult<String> {
        let prompt = Self::examples_prompt(material, profile);
        let request = GenerateContentRequest::from_parts(vec![Part::text(prompt)]);
        self.client.generate(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_spark_core::domain::{Language, StudyLevel};

    #[test]
    fn explanation_prompt_names_the_concept_twice() {
        let profile = UserProfile {
            study_level: StudyLevel::Primary,
            language: Language::Fr,
        };
        let prompt =
            GeminiEnrichmentAdapter::explanation_prompt("The water cycle.", "evaporation", &profile);
        assert_eq!(prompt.matches("\"evaporation\"").count(), 2);
        assert!(prompt.contains("'primary'"));
        assert!(prompt.contains("'fr'"));
    }

    #[test]
    fn examples_prompt_asks_for_real_world_applications() {
        let prompt =
            GeminiEnrichmentAdapter::examples_prompt("Supply and demand.", &UserProfile::default());
        assert!(prompt.contains("2-3 practical examples"));
        assert!(prompt.contains("\"\"\"Supply and demand.\"\"\""));
    }
}
