//! Application configuration loaded from environment variables.
//!
//! Secrets (JWT key, authority enrollment code) are injected as env vars
//! by the deployment; a `.env` file is honored for local development.

use std::env;

/// Which storage collaborator backs the report store and user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    /// Process-local maps; data is lost on restart.
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub storage_backend: StorageBackend,
    /// Base URL of the image classification service
    pub classifier_url: String,
    /// Per-request classifier timeout
    pub classifier_timeout_secs: u64,
    /// Poll interval advertised to notification clients
    pub notification_poll_secs: u64,
    /// How far the notification watermark trails the server clock
    pub notification_grace_secs: u64,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Code an `authority` registrant must present
    pub authority_enrollment_code: String,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            storage_backend: StorageBackend::Memory,
            classifier_url: "http://localhost:5001".to_string(),
            classifier_timeout_secs: 5,
            notification_poll_secs: 60,
            notification_grace_secs: 0,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            authority_enrollment_code: "AUTH123".to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => StorageBackend::Firestore,
            "memory" => StorageBackend::Memory,
            other => return Err(ConfigError::Invalid("STORAGE_BACKEND", other.to_string())),
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            storage_backend,
            classifier_url: env::var("CLASSIFIER_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:5001".to_string()),
            classifier_timeout_secs: env::var("CLASSIFIER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            notification_poll_secs: env::var("NOTIFICATION_POLL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            notification_grace_secs: env::var("NOTIFICATION_GRACE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            authority_enrollment_code: env::var("AUTHORITY_ENROLLMENT_CODE")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AUTHORITY_ENROLLMENT_CODE"))?,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
