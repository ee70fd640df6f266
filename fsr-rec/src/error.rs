//! Error types for fsr-rec
//!
//! Module-local failures (invalid frames, classifier errors, group table and
//! sentence errors) are converted into this type at the session boundary.

use thiserror::Error;

/// Main error type for the recognizer
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from the shared crate (config loading, I/O)
    #[error("Common error: {0}")]
    Common(#[from] fsr_common::Error),

    /// Classifier failed; recognition is paused until restarted
    #[error("Recognition unavailable: {0}")]
    RecognitionUnavailable(String),

    /// Rejected caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed replay file
    #[error("Replay error: {0}")]
    Replay(String),
}

/// Convenience Result type using the fsr-rec Error
pub type Result<T> = std::result::Result<T, Error>;
