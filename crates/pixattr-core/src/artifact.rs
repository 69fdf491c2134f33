//! Image artifacts
//!
//! Artifacts are free-form string settings attached to an image. The
//! analysis code consults a few well-known keys for its tunables.

use std::collections::BTreeMap;

/// Reference background color overriding the sampled corner.
pub const BACKGROUND: &str = "background";
/// Trim-specific background color; wins over [`BACKGROUND`].
pub const TRIM_BACKGROUND_COLOR: &str = "trim:background-color";
/// Selects edge erosion and sets how much background an edge may keep.
pub const TRIM_PERCENT_BACKGROUND: &str = "trim:percent-background";
/// Dither method used when quantizing.
pub const DITHER: &str = "dither";
/// Color similarity tolerance.
pub const FUZZ: &str = "fuzz";

/// String-keyed image settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    values: BTreeMap<String, String>,
}

impl Artifacts {
    /// Create an empty artifact map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over all key/value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parse the leading floating-point number of `s`.
///
/// Trailing text (units, a `%` sign) is ignored; no number at all yields 0.
///
/// # Examples
///
/// ```
/// use pixattr_core::artifact::leading_f64;
///
/// assert_eq!(leading_f64("75%"), 75.0);
/// assert_eq!(leading_f64(" 2.5e1px"), 25.0);
/// assert_eq!(leading_f64("abc"), 0.0);
/// ```
pub fn leading_f64(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            end = exp;
        }
    }
    // Shrink until the prefix parses ("1.2.3" -> "1.2")
    while end > 0 {
        if let Ok(v) = s[..end].parse::<f64>() {
            return v;
        }
        end -= 1;
    }
    0.0
}

/// Parse a fuzz setting: an absolute distance, or a percentage of
/// `quantum_range` when suffixed with `%`.
pub fn parse_fuzz(s: &str, quantum_range: u64) -> f64 {
    let value = leading_f64(s).max(0.0);
    if s.trim_end().ends_with('%') {
        value / 100.0 * quantum_range as f64
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut artifacts = Artifacts::new();
        assert!(artifacts.set(FUZZ, "5%").is_none());
        assert_eq!(artifacts.get(FUZZ), Some("5%"));
        assert_eq!(artifacts.set(FUZZ, "1").as_deref(), Some("5%"));
        assert!(artifacts.contains(FUZZ));
        assert_eq!(artifacts.remove(FUZZ).as_deref(), Some("1"));
        assert!(artifacts.get(FUZZ).is_none());
    }

    #[test]
    fn test_leading_f64_partial() {
        assert_eq!(leading_f64("100"), 100.0);
        assert_eq!(leading_f64("-3.5x"), -3.5);
        assert_eq!(leading_f64("1.2.3"), 1.2);
        assert_eq!(leading_f64("5e"), 5.0);
        assert_eq!(leading_f64(""), 0.0);
    }

    #[test]
    fn test_parse_fuzz() {
        assert_eq!(parse_fuzz("10%", 1000), 100.0);
        assert_eq!(parse_fuzz("42", 1000), 42.0);
        assert_eq!(parse_fuzz("-3", 1000), 0.0);
    }
}
