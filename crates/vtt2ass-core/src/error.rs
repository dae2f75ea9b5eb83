//! vtt2ass Error Definitions
//!
//! Defines error types used throughout the conversion pipeline.

use thiserror::Error;

use crate::captions::ParseError;

/// Core conversion error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Cue Layout Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Capacity exceeded: more than {limit} {what}")]
    CapacityError { what: &'static str, limit: usize },

    #[error("Shaping failed: {0}")]
    ShapingError(String),

    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("WebVTT parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Failed to load font {path}: {reason}")]
    FontLoadFailed { path: String, reason: String },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Shorthand for a capacity overflow on a fixed per-cue limit
    pub fn capacity(what: &'static str, limit: usize) -> Self {
        Self::CapacityError { what, limit }
    }

    /// True for errors that only invalidate the cue being laid out.
    ///
    /// The driver skips such a cue and continues with the next one;
    /// every other error aborts the run.
    pub fn is_cue_local(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::CapacityError { .. } | Self::ShapingError(_)
        )
    }
}
