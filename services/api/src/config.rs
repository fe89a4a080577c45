//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. Absence of a required credential is a
//! fatal startup condition, never a per-request error.

use std::net::SocketAddr;
use tracing::Level;

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
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: String,
    pub analysis_model: String,
    pub chat_model: String,
    pub ocr_model: String,
    pub storage_endpoint: String,
    pub storage_bucket: String,
    pub storage_token: String,
    pub llm_timeout_secs: u64,
    pub cors_origin: String,
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

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load External Service Credentials (required) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;
        let storage_endpoint = std::env::var("STORAGE_ENDPOINT")
            .map_err(|_| ConfigError::MissingVar("STORAGE_ENDPOINT".to_string()))?;
        let storage_bucket = std::env::var("STORAGE_BUCKET")
            .map_err(|_| ConfigError::MissingVar("STORAGE_BUCKET".to_string()))?;
        let storage_token = std::env::var("STORAGE_TOKEN")
            .map_err(|_| ConfigError::MissingVar("STORAGE_TOKEN".to_string()))?;

        // --- Load Adapter-specific Settings ---
        let analysis_model =
            std::env::var("ANALYSIS_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let ocr_model = std::env::var("OCR_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let llm_timeout_str =
            std::env::var("LLM_TIMEOUT_SECS").unwrap_or_else(|_| "60".to_string());
        let llm_timeout_secs = llm_timeout_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "LLM_TIMEOUT_SECS".to_string(),
                format!("'{}' is not a valid number of seconds", llm_timeout_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            analysis_model,
            chat_model,
            ocr_model,
            storage_endpoint,
            storage_bucket,
            storage_token,
            llm_timeout_secs,
            cors_origin,
        })
    }
}
