//! crates/study_spark_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or storage format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of characters of text persisted per history field.
pub const HISTORY_FIELD_LIMIT: usize = 1000;

/// The academic level the user studies at. Generation prompts are
/// adapted to this level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyLevel {
    Primary,
    Secondary,
    University,
    Professional,
    #[serde(rename = "self-taught")]
    SelfTaught,
}

impl StudyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyLevel::Primary => "primary",
            StudyLevel::Secondary => "secondary",
            StudyLevel::University => "university",
            StudyLevel::Professional => "professional",
            StudyLevel::SelfTaught => "self-taught",
        }
    }
}

/// The language the user wants generated content in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Es,
    En,
    Pt,
    Fr,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
            Language::Pt => "pt",
            Language::Fr => "fr",
        }
    }
}

/// Per-user study preferences, persisted in the document store and
/// created with these defaults on first access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default = "default_study_level")]
    pub study_level: StudyLevel,
    #[serde(default = "default_language")]
    pub language: Language,
}

fn default_study_level() -> StudyLevel {
    StudyLevel::University
}

fn default_language() -> Language {
    Language::Es
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            study_level: default_study_level(),
            language: default_language(),
        }
    }
}

/// The kind of study aid the user asked for. Selects the prompt
/// template and the expected output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AidType {
    Summary,
    Quiz,
    Faq,
    #[serde(rename = "mindmap_description")]
    MindMap,
}

impl AidType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AidType::Summary => "summary",
            AidType::Quiz => "quiz",
            AidType::Faq => "faq",
            AidType::MindMap => "mindmap_description",
        }
    }
}

impl fmt::Display for AidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AidType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(AidType::Summary),
            "quiz" => Ok(AidType::Quiz),
            "faq" => Ok(AidType::Faq),
            "mindmap_description" => Ok(AidType::MindMap),
            other => Err(format!("unknown aid type '{}'", other)),
        }
    }
}

/// One multiple-choice quiz question. A well-formed question always has
/// exactly four options and a correct-answer index inside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
}

/// One question/answer pair of an FAQ study guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// The study aid produced by one generation call.
///
/// `MindMapDescription` is an intermediate form: it is never shown to
/// the user and is only forwarded to the image-generation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StudyAid {
    Summary(String),
    Quiz(Vec<QuizQuestion>),
    Faq(Vec<FaqEntry>),
    MindMapDescription(String),
}

impl StudyAid {
    pub fn aid_type(&self) -> AidType {
        match self {
            StudyAid::Summary(_) => AidType::Summary,
            StudyAid::Quiz(_) => AidType::Quiz,
            StudyAid::Faq(_) => AidType::Faq,
            StudyAid::MindMapDescription(_) => AidType::MindMap,
        }
    }
}

/// A decoded image returned by the image-generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MindMapImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// The raw image a user uploaded, kept until it is replaced by the
/// next upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Everything a study-aid generation call needs: the material, the
/// requested aid type, and a snapshot of the user's preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AidRequest {
    pub aid_type: AidType,
    pub extracted_text: String,
    pub profile: UserProfile,
}

/// A successfully generated study aid, together with the prompt that
/// produced it so the history trail can record it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAid {
    pub aid: StudyAid,
    pub prompt: String,
}

/// One append-only audit entry written after a successful generation.
/// Never read back by the workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub original_image_name: String,
    pub extracted_text: String,
    pub aid_type: AidType,
    pub generated_aid: serde_json::Value,
    pub study_level: StudyLevel,
    pub language: Language,
    pub prompt_used: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Builds a history entry from a completed generation, truncating
    /// the free-text fields to [`HISTORY_FIELD_LIMIT`] characters.
    pub fn new(
        original_image_name: &str,
        extracted_text: &str,
        aid: &StudyAid,
        profile: &UserProfile,
        prompt: &str,
    ) -> Self {
        let generated_aid = match aid {
            StudyAid::Summary(text) | StudyAid::MindMapDescription(text) => {
                serde_json::Value::String(truncate_chars(text, HISTORY_FIELD_LIMIT))
            }
            StudyAid::Quiz(items) => {
                serde_json::to_value(items).unwrap_or(serde_json::Value::Null)
            }
            StudyAid::Faq(entries) => {
                serde_json::to_value(entries).unwrap_or(serde_json::Value::Null)
            }
        };

        Self {
            original_image_name: original_image_name.to_string(),
            extracted_text: truncate_chars(extracted_text, HISTORY_FIELD_LIMIT),
            aid_type: aid.aid_type(),
            generated_aid,
            study_level: profile.study_level,
            language: profile.language,
            prompt_used: truncate_chars(prompt, HISTORY_FIELD_LIMIT),
            created_at: Utc::now(),
        }
    }
}

/// Truncates a string to at most `limit` characters on a character
/// boundary.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aid_type_round_trips_through_its_name() {
        for aid_type in [AidType::Summary, AidType::Quiz, AidType::Faq, AidType::MindMap] {
            assert_eq!(aid_type.as_str().parse::<AidType>(), Ok(aid_type));
        }
        assert!("poster".parse::<AidType>().is_err());
    }

    #[test]
    fn profile_deserializes_with_defaults_for_missing_fields() {
        let profile: UserProfile = serde_json::from_str(r#"{"language":"en"}"#).unwrap();
        assert_eq!(profile.language, Language::En);
        assert_eq!(profile.study_level, StudyLevel::University);
    }

    #[test]
    fn truncation_respects_character_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn history_record_truncates_long_fields() {
        let long_text = "x".repeat(HISTORY_FIELD_LIMIT + 50);
        let record = HistoryRecord::new(
            "notes.png",
            &long_text,
            &StudyAid::Summary(long_text.clone()),
            &UserProfile::default(),
            &long_text,
        );
        assert_eq!(record.extracted_text.chars().count(), HISTORY_FIELD_LIMIT);
        assert_eq!(record.prompt_used.chars().count(), HISTORY_FIELD_LIMIT);
        assert_eq!(record.aid_type, AidType::Summary);
    }
}
