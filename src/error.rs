//! Unified error types for trackshift
//!
//! Error strategy:
//! - Input errors (empty path, non-positive factor): never retried, the
//!   caller must fix the argument.
//! - Collaborator errors (decode, analysis, processing, encode): surfaced
//!   with context; the asset's in-memory state is left unchanged so the
//!   instance stays usable.

use std::path::PathBuf;
use thiserror::Error;

/// Audio formats the bundled decoder understands, for error messages
pub const SUPPORTED_FORMATS: &str = "MP3, AAC, WAV, FLAC, OGG";

/// Top-level error type for trackshift operations
#[derive(Debug, Error)]
pub enum TrackshiftError {
    /// Bad caller input (empty path, non-positive tempo factor, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation needed samples but no path is available to load from
    #[error("No samples loaded; load an audio file first")]
    NotLoaded,

    #[error("Failed to decode audio file '{path}': {reason}\n  Supported formats: {SUPPORTED_FORMATS}")]
    DecodeError { path: PathBuf, reason: String },

    /// Feature extraction (pitch or tempo) failed
    #[error("Analysis failed: {reason}")]
    AnalysisError { reason: String },

    /// Time-stretch or pitch-shift processing failed
    #[error("Processing failed: {reason}")]
    ProcessingError { reason: String },

    /// Export attempted with no in-memory buffer
    #[error("Nothing to export; the asset has no samples in memory")]
    NothingToExport,

    #[error("Failed to encode audio file '{path}': {reason}")]
    EncodeError { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for trackshift operations
pub type Result<T> = std::result::Result<T, TrackshiftError>;

impl TrackshiftError {
    /// Returns true for errors the caller can only fix by changing input
    /// (retrying the same call will always fail again)
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            TrackshiftError::InvalidArgument(_) | TrackshiftError::NothingToExport
        )
    }

    /// Create a decode error with context about the issue
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TrackshiftError::DecodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an encode error with context about the issue
    pub fn encode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TrackshiftError::EncodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an analysis error
    pub fn analysis_error(reason: impl Into<String>) -> Self {
        TrackshiftError::AnalysisError {
            reason: reason.into(),
        }
    }

    /// Create a processing error
    pub fn processing_error(reason: impl Into<String>) -> Self {
        TrackshiftError::ProcessingError {
            reason: reason.into(),
        }
    }
}
