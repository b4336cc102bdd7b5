//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): PostgreSQL connection string. When unset the
///   service keeps API keys in memory, which is only useful for development.
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `API_KEY_PEPPER` (required): secret used to key the HMAC of stored API keys
/// - `ADMIN_TOKEN` (optional): bearer token for the key management routes.
///   The routes are not mounted when it is unset.
/// - `GITHUB_API_URL` / `GITHUB_TOKEN`: README source and optional credentials
/// - `LLM_API_URL` / `LLM_API_KEY` / `LLM_MODEL`: OpenAI-compatible chat endpoint
/// - `FETCH_TIMEOUT_SECS`, `LLM_TIMEOUT_SECS`, `MAX_README_BYTES`,
///   `MAX_CONCURRENT_GENERATIONS`: limits for the external calls
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    pub api_key_pepper: String,

    #[serde(default)]
    pub admin_token: Option<String>,

    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    #[serde(default)]
    pub github_token: Option<String>,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_max_readme_bytes")]
    pub max_readme_bytes: usize,

    #[serde(default = "default_llm_api_url")]
    pub llm_api_url: String,

    pub llm_api_key: String,

    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    #[serde(default = "default_max_concurrent_generations")]
    pub max_concurrent_generations: usize,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

/// 512 KiB. README text is forwarded verbatim into the model prompt.
fn default_max_readme_bytes() -> usize {
    512 * 1024
}

fn default_llm_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_max_concurrent_generations() -> usize {
    8
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., API_KEY_PEPPER)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: api_key_pepper -> API_KEY_PEPPER
        envy::from_env::<Config>()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}
