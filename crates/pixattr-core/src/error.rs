//! Error types for pixattr-core
//!
//! Provides a unified error type for the image model and the pixel-cache
//! accessors. Recoverable accessor failures surface here; fatal resource
//! errors never do (they are reported through the diagnostic sink and end
//! the process, see [`crate::diagnostics::fatal_resource_error`]).

use thiserror::Error;

/// pixattr-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid image dimensions
    #[error("invalid image dimensions: {columns}x{rows}")]
    InvalidDimension { columns: u32, rows: u32 },

    /// Invalid quantum depth
    #[error("invalid quantum depth: {0} bits")]
    InvalidDepth(u32),

    /// Palette required but not present
    #[error("palette required but not present")]
    PaletteRequired,

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Region does not intersect the canvas
    #[error("geometry {width}x{height}{x:+}{y:+} does not intersect a {columns}x{rows} canvas")]
    GeometryOutsideCanvas {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        columns: u32,
        rows: u32,
    },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unrecognized color specification
    #[error("unrecognized color: `{0}'")]
    InvalidColor(String),

    /// Pixel cache read failure for a row
    #[error("unable to read pixels at row {y}: {reason}")]
    CacheRead { y: i64, reason: String },

    /// Pixel cache write failure for a row
    #[error("unable to sync pixels at row {y}: {reason}")]
    CacheWrite { y: i64, reason: String },

    /// Worker pool could not be built
    #[error("unable to start worker pool: {0}")]
    WorkerPool(String),
}

/// Result type alias for pixattr-core operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failure() {
        let err = Error::CacheRead {
            y: 4,
            reason: "short read".into(),
        };
        assert_eq!(err.to_string(), "unable to read pixels at row 4: short read");
        let err = Error::GeometryOutsideCanvas {
            x: 10,
            y: -2,
            width: 3,
            height: 3,
            columns: 8,
            rows: 8,
        };
        assert_eq!(
            err.to_string(),
            "geometry 3x3+10-2 does not intersect a 8x8 canvas"
        );
    }

    #[test]
    fn test_every_variant_has_a_producer() {
        // exhaustive: a new variant needs a producing module listed here
        fn producer(err: &Error) -> &'static str {
            match err {
                Error::InvalidDimension { .. } => "cache",
                Error::InvalidDepth(_) => "quantum",
                Error::PaletteRequired => "image",
                Error::IndexOutOfBounds { .. } => "palette",
                Error::GeometryOutsideCanvas { .. } => "cache",
                Error::InvalidParameter(_) => "palette",
                Error::InvalidColor(_) => "color",
                Error::CacheRead { .. } => "cache",
                Error::CacheWrite { .. } => "cache",
                Error::WorkerPool(_) => "session",
            }
        }
        assert_eq!(producer(&Error::PaletteRequired), "image");
        assert_eq!(producer(&Error::WorkerPool("x".into())), "session");
    }
}
