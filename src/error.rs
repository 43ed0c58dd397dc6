//! Error types for mockview.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MockviewError {
    // Media capture errors
    #[error("Media access failed: {message}")]
    MediaAccess { message: String },

    #[error("Frame encoding failed: {message}")]
    FrameEncode { message: String },

    #[error("Audio chunk encoding failed: {message}")]
    ChunkEncode { message: String },

    // Scoring errors
    #[error("Scoring request failed: {message}")]
    Scoring { message: String },

    #[error("Scoring response could not be parsed: {message}")]
    ScoringParse { message: String },

    // Storage errors
    #[error("Storage error for key {key}: {message}")]
    Storage { key: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, MockviewError>;
