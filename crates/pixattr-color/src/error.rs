//! Error types for pixattr-color

use pixattr_core::Colorspace;
use thiserror::Error;

/// Errors that can occur during color processing and type enforcement
#[derive(Debug, Error)]
pub enum ColorError {
    /// Core library error (pixel cache, palette)
    #[error("core error: {0}")]
    Core(#[from] pixattr_core::Error),

    /// No transform exists between the two colorspaces
    #[error("unsupported colorspace transform: {from:?} -> {to:?}")]
    UnsupportedTransform { from: Colorspace, to: Colorspace },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Quantization error
    #[error("quantization error: {0}")]
    QuantizationError(String),
}

/// Result type for color operations
pub type ColorResult<T> = Result<T, ColorError>;
