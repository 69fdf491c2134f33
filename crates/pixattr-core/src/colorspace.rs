//! Colorspace tags
//!
//! The core never does colorspace math; it only needs to know which family
//! an image's samples belong to.

/// Colorspace an image's samples are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Colorspace {
    Undefined,
    /// Linear RGB
    Rgb,
    /// Gamma-encoded sRGB
    #[default]
    Srgb,
    /// Gamma-encoded gray (all three color samples equal)
    Gray,
    /// Linear gray
    LinearGray,
    /// Four-channel color separation; black lives in the index sample
    Cmyk,
    Cmy,
    Hsl,
    Hsb,
    Lab,
    YCbCr,
    /// Opacity participates in quantization
    Transparent,
}

impl Colorspace {
    /// Whether samples can be read as sRGB-family red/green/blue.
    pub fn is_srgb_compatible(self) -> bool {
        matches!(
            self,
            Colorspace::Rgb | Colorspace::Srgb | Colorspace::Gray | Colorspace::LinearGray
        )
    }

    /// Whether this is a gray colorspace.
    pub fn is_gray(self) -> bool {
        matches!(self, Colorspace::Gray | Colorspace::LinearGray)
    }

    /// Whether the red sample holds a hue angle that wraps around.
    pub fn is_hue_based(self) -> bool {
        matches!(self, Colorspace::Hsl | Colorspace::Hsb)
    }

    /// Whether this is the four-channel separation space.
    pub fn is_separation(self) -> bool {
        self == Colorspace::Cmyk
    }
}
