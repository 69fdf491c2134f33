//! pixattr-test - Regression test framework for pixattr
//!
//! Provides the [`RegParams`] comparison harness used by the `*_reg.rs`
//! integration tests, synthetic image builders, and a one-time log
//! subscriber for test binaries.
//!
//! # Usage
//!
//! ```ignore
//! use pixattr_test::{RegParams, synth};
//!
//! let mut rp = RegParams::new("bounds");
//! rp.compare_rects(expected, actual);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "compare" (default) or "display"
//! - `RUST_LOG`: Log filter for the test subscriber

mod error;
mod params;
pub mod synth;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Install a `tracing` subscriber writing to the test output.
///
/// Safe to call repeatedly; only the first call has an effect. The filter
/// comes from `RUST_LOG` and defaults to `warn`.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
