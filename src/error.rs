//! Custom error types for paperscout.
//!
//! This module defines all error types used throughout the pipeline.
//! All functions return `Result<T, ScoutError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for paperscout operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum ScoutError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response or artifact parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by external API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: i32,
        /// Error message from API
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The language model produced an empty search query
    #[error("Language model returned an empty search query")]
    EmptyQuery,

    /// Structured model output could not be decoded or broke the schema
    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    /// Model returned a paper that is not among the candidates
    #[error("Model returned a paper not present in the candidate set: {0}")]
    Hallucinated(String),

    /// An ensemble collaborator could not produce an estimate
    #[error("Collaborator '{model}' unavailable: {reason}")]
    CollaboratorUnavailable {
        /// Collaborator name
        model: String,
        /// Underlying cause
        reason: String,
    },
}

impl ScoutError {
    /// Wrap any error as a collaborator failure for `model`.
    pub fn collaborator(model: &str, reason: impl std::fmt::Display) -> Self {
        Self::CollaboratorUnavailable {
            model: model.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias using `ScoutError`
pub type Result<T> = std::result::Result<T, ScoutError>;
