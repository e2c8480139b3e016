//! Error types for the simulation kernel.
//!
//! Only the load-time and replay boundaries can fail. Per-frame
//! simulation calls communicate outcomes through return values instead.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the simulation kernel.
#[derive(Debug, Error)]
pub enum GameError {
    /// Zone data could not be parsed.
    #[error("Failed to parse zone data '{source_name}': {message}")]
    DataParseError {
        /// File name or label of the data that failed to parse.
        source_name: String,
        /// Parser error message.
        message: String,
    },

    /// Zone data parsed but failed validation.
    #[error("Zone '{zone}' is invalid: {}", problems.join("; "))]
    InvalidZone {
        /// Zone identifier.
        zone: String,
        /// Every problem found during validation.
        problems: Vec<String>,
    },

    /// Replay (de)serialization failed.
    #[error("Replay error: {0}")]
    ReplayError(String),

    /// Replay was written by an incompatible version.
    #[error("Replay version mismatch: expected {expected}, got {found}")]
    ReplayVersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// Underlying IO failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
