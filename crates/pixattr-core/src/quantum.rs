//! Quantum arithmetic
//!
//! A quantum is one channel sample. Samples are stored as `u64` regardless
//! of the image's quantum depth; the depth only bounds the value range to
//! `[0, 2^depth - 1]`.
//!
//! Requantization between the quantum range and an arbitrary `d`-bit range
//! is done in exact integer arithmetic (`u128` intermediates) so that a
//! round trip never drifts, even at 64-bit quantum depth.

use crate::error::{Error, Result};

/// One channel sample.
pub type Quantum = u64;

/// Largest quantum range for which a per-value lookup table is built.
///
/// Images whose quantum range exceeds this use the direct (per-pixel
/// search) strategies instead.
pub const MAX_MAP: u64 = 65535;

/// Quantum depth (bits per channel sample)
///
/// # Examples
///
/// ```
/// use pixattr_core::QuantumDepth;
///
/// assert_eq!(QuantumDepth::Q8.range(), 255);
/// assert_eq!(QuantumDepth::Q16.range(), 65535);
/// assert_eq!(QuantumDepth::Q64.range(), u64::MAX);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum QuantumDepth {
    /// 8 bits per sample
    Q8 = 8,
    /// 16 bits per sample
    Q16 = 16,
    /// 32 bits per sample
    Q32 = 32,
    /// 64 bits per sample
    Q64 = 64,
}

impl QuantumDepth {
    /// Create a `QuantumDepth` from a raw bit count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDepth`] if `bits` is not 8, 16, 32, or 64.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(QuantumDepth::Q8),
            16 => Ok(QuantumDepth::Q16),
            32 => Ok(QuantumDepth::Q32),
            64 => Ok(QuantumDepth::Q64),
            _ => Err(Error::InvalidDepth(bits)),
        }
    }

    /// Number of bits per sample.
    #[inline]
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// The maximum representable sample value (`QuantumRange`).
    #[inline]
    pub fn range(self) -> Quantum {
        quantum_range(self.bits())
    }

    /// Whether the whole value range fits a lookup table of `MAX_MAP + 1`
    /// entries.
    #[inline]
    pub fn fits_map(self) -> bool {
        self.range() <= MAX_MAP
    }
}

/// Maximum value representable with `depth` bits (`2^depth - 1`).
///
/// `depth` is clamped to `1..=64`.
#[inline]
pub fn quantum_range(depth: u32) -> Quantum {
    match depth.clamp(1, 64) {
        64 => u64::MAX,
        d => (1u64 << d) - 1,
    }
}

/// `round(num / den)` with halves rounding up.
#[inline]
fn div_round(num: u128, den: u128) -> u128 {
    (num + den / 2) / den
}

/// Scale a quantum from the full `quantum_range` to `[0, range]`.
#[inline]
pub fn scale_quantum_to_any(value: Quantum, range: Quantum, quantum_range: Quantum) -> Quantum {
    if quantum_range == 0 {
        return 0;
    }
    let value = value.min(quantum_range);
    div_round(u128::from(range) * u128::from(value), u128::from(quantum_range)) as Quantum
}

/// Scale a value in `[0, range]` back to the full `quantum_range`.
#[inline]
pub fn scale_any_to_quantum(value: Quantum, range: Quantum, quantum_range: Quantum) -> Quantum {
    if range == 0 {
        return 0;
    }
    let value = value.min(range);
    div_round(u128::from(quantum_range) * u128::from(value), u128::from(range)) as Quantum
}

/// Round-trip a quantum through a `depth`-bit representation.
#[inline]
pub fn requantize(value: Quantum, depth: u32, quantum_range: Quantum) -> Quantum {
    let range = self::quantum_range(depth);
    scale_any_to_quantum(
        scale_quantum_to_any(value, range, quantum_range),
        range,
        quantum_range,
    )
}

/// Whether `value` survives a round trip through `depth` bits unchanged.
#[inline]
pub fn is_at_depth(value: Quantum, depth: u32, quantum_range: Quantum) -> bool {
    requantize(value, depth, quantum_range) == value
}

/// Smallest depth in `1..=max_depth` at which `value` round-trips exactly.
///
/// The search starts at `from` (clamped to at least 1) so callers that
/// already know a lower bound can resume instead of restarting at 1.
/// Returns `max_depth` when no smaller depth is exact.
#[inline]
pub fn minimal_depth_from(value: Quantum, from: u32, max_depth: u32, quantum_range: Quantum) -> u32 {
    let mut depth = from.max(1);
    while depth < max_depth {
        if is_at_depth(value, depth, quantum_range) {
            break;
        }
        depth += 1;
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantum_range() {
        assert_eq!(quantum_range(1), 1);
        assert_eq!(quantum_range(8), 255);
        assert_eq!(quantum_range(63), (1u64 << 63) - 1);
        assert_eq!(quantum_range(64), u64::MAX);
    }

    #[test]
    fn test_from_bits() {
        assert_eq!(QuantumDepth::from_bits(16).unwrap(), QuantumDepth::Q16);
        assert!(QuantumDepth::from_bits(12).is_err());
    }

    #[test]
    fn test_scale_endpoints() {
        let qr = QuantumDepth::Q16.range();
        assert_eq!(scale_quantum_to_any(0, 1, qr), 0);
        assert_eq!(scale_quantum_to_any(qr, 1, qr), 1);
        assert_eq!(scale_any_to_quantum(1, 1, qr), qr);
        assert_eq!(scale_any_to_quantum(255, 255, qr), qr);
    }

    #[test]
    fn test_eight_bit_values_are_exact_at_depth_8_in_q16() {
        let qr = QuantumDepth::Q16.range();
        // 8-bit values widened by 257 are exactly representable in 8 bits
        for v in 0..=255u64 {
            assert!(is_at_depth(v * 257, 8, qr));
        }
        assert!(!is_at_depth(1, 8, qr));
    }

    #[test]
    fn test_minimal_depth() {
        let qr = QuantumDepth::Q8.range();
        assert_eq!(minimal_depth_from(0, 1, 8, qr), 1);
        assert_eq!(minimal_depth_from(255, 1, 8, qr), 1);
        assert_eq!(minimal_depth_from(85, 1, 8, qr), 2);
        assert_eq!(minimal_depth_from(17, 1, 8, qr), 4);
        assert_eq!(minimal_depth_from(1, 1, 8, qr), 8);
        // resuming from a higher bound never lowers the answer
        assert_eq!(minimal_depth_from(0, 5, 8, qr), 5);
    }

    #[test]
    fn test_q64_round_trip_does_not_overflow() {
        let qr = QuantumDepth::Q64.range();
        assert!(is_at_depth(u64::MAX, 1, qr));
        assert!(is_at_depth(0, 1, qr));
        assert!(is_at_depth(12345, 64, qr));
        assert!(!is_at_depth(12345, 8, qr));
    }
}
