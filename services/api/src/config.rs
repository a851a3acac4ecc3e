//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// Default base URL of the hosted text/vision generation endpoint.
pub const DEFAULT_GENERATION_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// API key sent to both hosted AI endpoints.
    pub google_ai_api_key: String,
    pub generation_base_url: String,
    pub generation_model: String,
    pub image_model: String,
    /// Base URL of the hosted document store.
    pub store_base_url: String,
    /// Application namespace for document-store paths.
    pub app_id: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys ---
        let google_ai_api_key = std::env::var("GOOGLE_AI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("GOOGLE_AI_API_KEY".to_string()))?;

        // --- Load Adapter-specific Settings ---
        let generation_base_url = std::env::var("GENERATION_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GENERATION_BASE_URL.to_string());
        let generation_model = std::env::var("GENERATION_MODEL")
            .unwrap_or_else(|_| "gemini-2.0-flash".to_string());
        let image_model = std::env::var("IMAGE_MODEL")
            .unwrap_or_else(|_| "imagen-3.0-generate-002".to_string());

        let store_base_url = std::env::var("STORE_BASE_URL")
            .map_err(|_| ConfigError::MissingVar("STORE_BASE_URL".to_string()))?;
        let app_id = std::env::var("APP_ID")
            .unwrap_or_else(|_| "study-spark-ai-default".to_string());

        Ok(Self {
            bind_address,
            log_level,
            google_ai_api_key,
            generation_base_url,
            generation_model,
            image_model,
            store_base_url,
            app_id,
        })
    }
}
