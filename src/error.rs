//! Error types for the orchestration layer.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while calling Gemini or shaping its responses.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Response text was missing, empty, or did not match the declared shape.
    #[error("Failed to parse model response: {0}")]
    ParseError(String),

    /// The HTTP round trip itself failed (network, auth, quota).
    #[error("Transport error: {message}")]
    TransportError {
        /// HTTP status code, when the request reached the service.
        status_code: Option<u16>,
        message: String,
        /// Whether a caller choosing to retry could plausibly succeed.
        is_retryable: bool,
        /// Server-requested delay before the next attempt, when advertised.
        retry_after: Option<Duration>,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Prompt template rendering error.
    #[error("Prompt template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    /// A generic error for other cases.
    #[error("Orchestration error: {0}")]
    Other(String),
}

impl GeminiError {
    /// Check if this error is worth retrying at a higher layer.
    ///
    /// `ParseError` counts as retryable: the model may emit well-formed
    /// output on a second attempt. This layer itself never retries; the
    /// flag is advisory for callers that own a retry policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            GeminiError::ParseError(_) => true,
            GeminiError::TransportError { is_retryable, .. } => *is_retryable,
            _ => false,
        }
    }
}

impl From<crate::extract::ExtractError> for GeminiError {
    fn from(err: crate::extract::ExtractError) -> Self {
        GeminiError::ParseError(err.to_string())
    }
}
