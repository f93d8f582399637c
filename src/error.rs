//! Error types for the finance advisory engine

use thiserror::Error;

/// Result type alias for advisory operations
pub type Result<T> = std::result::Result<T, AdvisoryError>;

#[derive(Error, Debug)]
pub enum AdvisoryError {

    // =============================
    // Generation Pipeline Errors
    // =============================

    /// Generation service unreachable, non-2xx, empty payload or timed out
    #[error("Transport error: {0}")]
    Transport(String),

    /// No plausible JSON could be recovered from the model text
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Parsed structure does not match the advisor's schema
    #[error("Schema error: {0}")]
    Schema(String),

    // =============================
    // Caller-Facing Errors
    // =============================

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AdvisoryError {
    /// Short label used in logs and fallback reasons
    pub fn label(&self) -> &'static str {
        match self {
            AdvisoryError::Transport(_) | AdvisoryError::HttpError(_) => "transport",
            AdvisoryError::MalformedResponse(_) | AdvisoryError::SerializationError(_) => {
                "malformed_response"
            }
            AdvisoryError::Schema(_) => "schema",
            AdvisoryError::InvalidProfile(_) => "invalid_profile",
            AdvisoryError::Config(_) => "config",
            AdvisoryError::IoError(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(AdvisoryError::Transport("x".into()).label(), "transport");
        assert_eq!(AdvisoryError::Schema("x".into()).label(), "schema");
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            AdvisoryError::from(parse_err).label(),
            "malformed_response"
        );
    }
}
