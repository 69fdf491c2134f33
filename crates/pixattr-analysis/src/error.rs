//! Error types for pixattr-analysis

use thiserror::Error;

/// Errors that can occur during image analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Core library error (pixel cache, geometry, palette)
    #[error("core error: {0}")]
    Core(#[from] pixattr_core::Error),

    /// Requested depth is outside `1..=64`
    #[error("invalid depth: {0} bits")]
    InvalidDepth(u32),
}

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
