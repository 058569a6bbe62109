//! Error types for the storewatch service

/// Errors that can occur in the storewatch service
#[derive(Debug, thiserror::Error)]
pub enum StorewatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP request timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notifier error: {0}")]
    Notifier(String),
}

/// Result type alias for storewatch operations
pub type Result<T> = std::result::Result<T, StorewatchError>;
