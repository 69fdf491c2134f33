//! Regression test parameters and operations

use pixattr_core::{Image, Rect};

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Compare results with expected values (default)
    #[default]
    Compare,
    /// Display mode - print every comparison, failing ones included
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// Tracks the state of a regression test: the test name, current index,
/// mode, and success status. Every `compare_*` call advances the index so
/// failures can be located in the output.
pub struct RegParams {
    /// Name of the test (e.g., "bounds")
    pub test_name: String,
    /// Current test index (incremented before each comparison)
    index: usize,
    /// Test mode
    pub mode: RegTestMode,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// Also installs the test log subscriber, see [`crate::init_logging`].
    pub fn new(test_name: &str) -> Self {
        crate::init_logging();
        let mode = RegTestMode::from_env();

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, msg: String) {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
    }

    /// Compare two floating-point values
    ///
    /// Returns `true` if the values match within `delta`.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();
        if self.display() {
            eprintln!("  [{}] expected = {}, actual = {}", self.index, expected, actual);
        }

        if diff > delta {
            let msg = format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            );
            self.fail(msg);
            false
        } else {
            true
        }
    }

    /// Compare two rectangles for exact equality
    pub fn compare_rects(&mut self, expected: Rect, actual: Rect) -> bool {
        self.index += 1;
        if self.display() {
            eprintln!("  [{}] expected = {}, actual = {}", self.index, expected, actual);
        }
        if expected != actual {
            let msg = format!(
                "Failure in {}_reg: rect comparison for index {}\n\
                 expected = {:?}, actual = {:?}",
                self.test_name, self.index, expected, actual
            );
            self.fail(msg);
            false
        } else {
            true
        }
    }

    /// Compare two images pixel by pixel
    ///
    /// Dimensions and every pixel sample must match; other attributes are
    /// not compared.
    pub fn compare_images(&mut self, image1: &Image, image2: &Image) -> bool {
        self.index += 1;

        if image1.columns() != image2.columns() || image1.rows() != image2.rows() {
            let msg = format!(
                "Failure in {}_reg: image comparison for index {} - dimension mismatch",
                self.test_name, self.index
            );
            self.fail(msg);
            return false;
        }

        let (pixels1, pixels2) = match (image1.pixels(), image2.pixels()) {
            (Ok(p1), Ok(p2)) => (p1, p2),
            (Err(e), _) | (_, Err(e)) => {
                let msg = format!(
                    "Failure in {}_reg: image comparison for index {} - read failed: {}",
                    self.test_name, self.index, e
                );
                self.fail(msg);
                return false;
            }
        };

        let columns = image1.columns() as usize;
        if let Some(i) = pixels1.iter().zip(&pixels2).position(|(p1, p2)| p1 != p2) {
            let msg = format!(
                "Failure in {}_reg: image comparison for index {} - pixel mismatch at ({}, {})",
                self.test_name,
                self.index,
                i % columns,
                i / columns
            );
            self.fail(msg);
            return false;
        }

        true
    }

    /// Clean up and report results
    ///
    /// Returns `true` if all comparisons passed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all tests have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}
