//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur during regression testing
#[derive(Debug, Error)]
pub enum TestError {
    /// Failed to build a synthetic image
    #[error("failed to build synthetic image '{name}': {source}")]
    Synth {
        name: &'static str,
        #[source]
        source: pixattr_core::Error,
    },
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
