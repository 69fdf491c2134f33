//! Color specifications
//!
//! Parses the color strings found in image artifacts (`background`,
//! `trim:background-color`) into pixels at a given quantum depth.
//!
//! Accepted forms:
//!
//! - `#rgb`, `#rrggbb`, `#rrggbbaa`, `#rrrrggggbbbb`
//! - `rgb(r,g,b)` and `rgba(r,g,b,a)` with 8-bit components (or `n%`) and
//!   alpha in `0..=1`
//! - `gray(n)` / `grey(n)`
//! - `none` / `transparent`
//! - a handful of named colors

use crate::error::{Error, Result};
use crate::pixel::Pixel;
use crate::quantum::{Quantum, QuantumDepth, scale_any_to_quantum};

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("maroon", [128, 0, 0]),
    ("navy", [0, 0, 128]),
    ("orange", [255, 165, 0]),
    ("purple", [128, 0, 128]),
];

/// Parse a color specification into a pixel at `depth`.
///
/// # Errors
///
/// Returns [`Error::InvalidColor`] if the string is not recognized.
///
/// # Examples
///
/// ```
/// use pixattr_core::{Pixel, QuantumDepth, parse_color};
///
/// let white = parse_color("#fff", QuantumDepth::Q16).unwrap();
/// assert_eq!(white, Pixel::gray(65535));
/// let red = parse_color("rgb(255,0,0)", QuantumDepth::Q8).unwrap();
/// assert_eq!(red, Pixel::rgb(255, 0, 0));
/// ```
pub fn parse_color(spec: &str, depth: QuantumDepth) -> Result<Pixel> {
    let qr = depth.range();
    let invalid = || Error::InvalidColor(spec.to_string());
    let s = spec.trim().to_ascii_lowercase();

    if s == "none" || s == "transparent" {
        return Ok(Pixel::rgbo(0, 0, 0, qr));
    }
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex, qr).ok_or_else(invalid);
    }
    if let Some(args) = function_args(&s, "rgba") {
        let parts = split_args(args);
        if parts.len() != 4 {
            return Err(invalid());
        }
        let mut pixel = rgb_from_parts(&parts[..3], qr).ok_or_else(invalid)?;
        let alpha: f64 = parts[3].parse().map_err(|_| invalid())?;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(invalid());
        }
        pixel.opacity = qr - (alpha * qr as f64).round() as Quantum;
        return Ok(pixel);
    }
    if let Some(args) = function_args(&s, "rgb") {
        let parts = split_args(args);
        if parts.len() != 3 {
            return Err(invalid());
        }
        return rgb_from_parts(&parts, qr).ok_or_else(invalid);
    }
    if let Some(args) = function_args(&s, "gray").or_else(|| function_args(&s, "grey")) {
        let value = component(args.trim(), qr).ok_or_else(invalid)?;
        return Ok(Pixel::gray(value));
    }
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == s)
        .map(|(_, [r, g, b])| {
            Pixel::rgb(scale8(*r, qr), scale8(*g, qr), scale8(*b, qr))
        })
        .ok_or_else(invalid)
}

fn scale8(v: u8, qr: Quantum) -> Quantum {
    scale_any_to_quantum(Quantum::from(v), 255, qr)
}

fn function_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn split_args(args: &str) -> Vec<&str> {
    args.split(',').map(str::trim).collect()
}

/// One color component: `0..=255` or a percentage.
fn component(part: &str, qr: Quantum) -> Option<Quantum> {
    if let Some(pct) = part.strip_suffix('%') {
        let pct: f64 = pct.trim().parse().ok()?;
        if !(0.0..=100.0).contains(&pct) {
            return None;
        }
        return Some((pct / 100.0 * qr as f64).round() as Quantum);
    }
    let v: u8 = part.parse().ok()?;
    Some(scale8(v, qr))
}

fn rgb_from_parts(parts: &[&str], qr: Quantum) -> Option<Pixel> {
    Some(Pixel::rgb(
        component(parts[0], qr)?,
        component(parts[1], qr)?,
        component(parts[2], qr)?,
    ))
}

fn parse_hex(hex: &str, qr: Quantum) -> Option<Pixel> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    // (digits per channel, channel count)
    let (width, channels) = match hex.len() {
        3 => (1, 3),
        6 => (2, 3),
        8 => (2, 4),
        12 => (4, 3),
        16 => (4, 4),
        _ => return None,
    };
    let range = (1u64 << (4 * width)) - 1;
    let mut samples = [0 as Quantum; 4];
    for (i, sample) in samples.iter_mut().enumerate().take(channels) {
        let digits = &hex[i * width..(i + 1) * width];
        let v = u64::from_str_radix(digits, 16).ok()?;
        *sample = scale_any_to_quantum(v, range, qr);
    }
    let opacity = if channels == 4 { qr - samples[3] } else { 0 };
    Some(Pixel::rgbo(samples[0], samples[1], samples[2], opacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        let q8 = QuantumDepth::Q8;
        assert_eq!(parse_color("#000", q8).unwrap(), Pixel::gray(0));
        assert_eq!(parse_color("#ff8000", q8).unwrap(), Pixel::rgb(255, 128, 0));
        assert_eq!(
            parse_color("#ff000080", q8).unwrap(),
            Pixel::rgbo(255, 0, 0, 127)
        );
        assert_eq!(
            parse_color("#ffff00000000", QuantumDepth::Q16).unwrap(),
            Pixel::rgb(65535, 0, 0)
        );
    }

    #[test]
    fn test_functional_forms() {
        let q8 = QuantumDepth::Q8;
        assert_eq!(parse_color("gray(128)", q8).unwrap(), Pixel::gray(128));
        assert_eq!(parse_color("rgb(100%, 0%, 0%)", q8).unwrap(), Pixel::rgb(255, 0, 0));
        assert_eq!(
            parse_color("rgba(0,0,0,0)", q8).unwrap(),
            Pixel::rgbo(0, 0, 0, 255)
        );
    }

    #[test]
    fn test_names_and_errors() {
        let q8 = QuantumDepth::Q8;
        assert_eq!(parse_color("White", q8).unwrap(), Pixel::gray(255));
        assert_eq!(parse_color("none", q8).unwrap().opacity, 255);
        assert!(parse_color("#12345", q8).is_err());
        assert!(parse_color("chartreuse-ish", q8).is_err());
        assert!(parse_color("rgb(1,2)", q8).is_err());
    }
}
