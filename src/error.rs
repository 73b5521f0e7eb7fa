//! Error handling for Voiceprint
//!
//! Validation errors always propagate to the caller; an absent row or a
//! duplicate id on insert is a typed outcome rather than an error.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Voiceprint operations
pub type Result<T> = std::result::Result<T, VoiceprintError>;

/// Main error type for Voiceprint operations
#[derive(Error, Debug)]
pub enum VoiceprintError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    // Store Validation Errors
    #[error("Invalid table name: {name:?} (identifiers are [A-Za-z_][A-Za-z0-9_]*)")]
    InvalidTableName { name: String },

    #[error("Invalid speaker id: {id} (must be exactly 9 decimal digits)")]
    InvalidSpeakerId { id: i64 },

    #[error("Speaker id is not an integer: {value:?}")]
    SpeakerIdParse { value: String },

    #[error("Shape {shape:?} implies {expected} elements, got {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    // Store Runtime Errors
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Malformed feature blob: {reason}")]
    MalformedBlob { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoiceprintError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            VoiceprintError::FileNotFound { .. } => "FILE_NOT_FOUND",
            VoiceprintError::InvalidAudio { .. } => "INVALID_AUDIO",
            VoiceprintError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            VoiceprintError::EmptyAudio => "EMPTY_AUDIO",
            VoiceprintError::InvalidTableName { .. } => "INVALID_TABLE_NAME",
            VoiceprintError::InvalidSpeakerId { .. } => "INVALID_SPEAKER_ID",
            VoiceprintError::SpeakerIdParse { .. } => "SPEAKER_ID_PARSE",
            VoiceprintError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            VoiceprintError::Storage(_) => "STORAGE_ERROR",
            VoiceprintError::MalformedBlob { .. } => "MALFORMED_BLOB",
            VoiceprintError::Io(_) => "IO_ERROR",
        }
    }

    /// Check if this error was raised before any file or database access
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            VoiceprintError::InvalidTableName { .. }
                | VoiceprintError::InvalidSpeakerId { .. }
                | VoiceprintError::SpeakerIdParse { .. }
                | VoiceprintError::ShapeMismatch { .. }
        )
    }
}
