//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; nothing here is refreshed at
//! runtime.

use std::env;

/// Default TMDB API base URL.
const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// TMDB API key (v3 auth)
    pub tmdb_api_key: String,
    /// TMDB API base URL (overridable for tests)
    pub tmdb_base_url: String,
    /// Firebase web API key (Identity Toolkit REST)
    pub firebase_api_key: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Directory for locally persisted data (watchlist)
    pub data_dir: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            tmdb_api_key: "test_tmdb_key".to_string(),
            tmdb_base_url: TMDB_BASE_URL.to_string(),
            firebase_api_key: "test_firebase_key".to_string(),
            gcp_project_id: "test-project".to_string(),
            data_dir: ".".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            tmdb_api_key: env::var("TMDB_API_KEY")
                .map_err(|_| ConfigError::Missing("TMDB_API_KEY"))?,
            tmdb_base_url: env::var("TMDB_BASE_URL")
                .unwrap_or_else(|_| TMDB_BASE_URL.to_string()),
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
