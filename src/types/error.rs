//! Error types for Chime

/// Main error type for Chime operations
#[derive(Debug, thiserror::Error)]
pub enum ChimeError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Implement From conversions for common error types

impl From<std::io::Error> for ChimeError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ChimeError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for ChimeError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<bson::ser::Error> for ChimeError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("BSON error: {}", err))
    }
}

impl From<mongodb::error::Error> for ChimeError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<reqwest::Error> for ChimeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Telegram(err.to_string())
    }
}

/// Result type alias for Chime operations
pub type Result<T> = std::result::Result<T, ChimeError>;
