//! Pixel color comparison
//!
//! Decides whether a pixel matches a target color, either exactly or
//! within a fuzz distance.

use crate::colorspace::Colorspace;
use crate::pixel::{OPAQUE_OPACITY, Pixel};
use crate::quantum::Quantum;

/// Smallest fuzz distance honored by the fuzzy comparison (√½).
pub const MIN_FUZZ: f64 = std::f64::consts::FRAC_1_SQRT_2;

const EPSILON: f64 = 1.0e-12;

/// Tolerance policy for color matching.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Tolerance {
    /// Every participating channel must be numerically equal.
    Exact,
    /// Weighted Euclidean distance below the given fuzz (in quantum units).
    Fuzzy(f64),
    /// Fuzzy with the minimum fuzz.
    #[default]
    Similar,
}

/// Color comparator configured for one image.
///
/// # Examples
///
/// ```
/// use pixattr_core::{Colorspace, Comparator, Pixel, Tolerance};
///
/// let cmp = Comparator::new(Tolerance::Fuzzy(10.0), false, Colorspace::Srgb, 255);
/// assert!(cmp.similar(&Pixel::gray(100), &Pixel::gray(105)));
/// assert!(!cmp.similar(&Pixel::gray(100), &Pixel::gray(120)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparator {
    tolerance: Tolerance,
    matte: bool,
    colorspace: Colorspace,
    quantum_range: Quantum,
}

impl Comparator {
    pub fn new(
        tolerance: Tolerance,
        matte: bool,
        colorspace: Colorspace,
        quantum_range: Quantum,
    ) -> Self {
        Self {
            tolerance,
            matte,
            colorspace,
            quantum_range,
        }
    }

    #[inline]
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Whether `p` matches `q` under this comparator's tolerance.
    pub fn similar(&self, p: &Pixel, q: &Pixel) -> bool {
        match self.tolerance {
            Tolerance::Exact => self.exact(p, q),
            Tolerance::Fuzzy(fuzz) => self.fuzzy(p, q, fuzz),
            Tolerance::Similar => self.fuzzy(p, q, 0.0),
        }
    }

    fn exact(&self, p: &Pixel, q: &Pixel) -> bool {
        p.red == q.red
            && p.green == q.green
            && p.blue == q.blue
            && (!self.matte || p.opacity == q.opacity)
            && (self.colorspace != Colorspace::Cmyk || p.index == q.index)
    }

    fn fuzzy(&self, p: &Pixel, q: &Pixel, fuzz: f64) -> bool {
        let qr = self.quantum_range as f64;
        let mut fuzz = fuzz.max(MIN_FUZZ);
        fuzz *= fuzz;
        let mut scale = 1.0;
        let mut distance = 0.0;
        if self.matte {
            let opacity = p.opacity as f64 - q.opacity as f64;
            distance = opacity * opacity;
            if distance > fuzz {
                return false;
            }
            // both sides carry alpha
            let alpha = |px: &Pixel| (qr - px.opacity as f64) / qr;
            scale = alpha(p) * alpha(q);
            if scale <= EPSILON {
                return true;
            }
        }
        distance *= 3.0;
        fuzz *= 3.0;

        let mut red = p.red as f64 - q.red as f64;
        if self.colorspace.is_hue_based() {
            if red > qr / 2.0 {
                red -= qr;
            } else if red < -qr / 2.0 {
                red += qr;
            }
            red *= 2.0;
        }
        for delta in [
            red,
            p.green as f64 - q.green as f64,
            p.blue as f64 - q.blue as f64,
        ] {
            distance += scale * delta * delta;
            if distance > fuzz {
                return false;
            }
        }
        if self.colorspace == Colorspace::Cmyk {
            let black = p.index as f64 - q.index as f64;
            distance += scale * black * black;
            if distance > fuzz {
                return false;
            }
        }
        true
    }
}

/// Whether a pixel counts as fully opaque.
#[inline]
pub fn is_opaque(pixel: &Pixel) -> bool {
    pixel.opacity == OPAQUE_OPACITY
}
