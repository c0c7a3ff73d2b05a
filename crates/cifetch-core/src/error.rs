//! Error types for cifetch

use thiserror::Error;

/// Main error type for cifetch
#[derive(Error, Debug)]
pub enum CifetchError {
    #[error("Configuration file not found in {0}")]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CifetchError>;
