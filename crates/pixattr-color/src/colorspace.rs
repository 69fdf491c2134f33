//! Colorspace transforms
//!
//! Transforms between the colorspaces type enforcement needs:
//!
//! - sRGB (also `Transparent` and `Undefined`, which hold sRGB samples)
//! - linear RGB
//! - gray and linear gray (Rec. 601 luma)
//! - CMYK, with black in the index sample
//!
//! Every transform goes through normalized nonlinear sRGB. Indexed images
//! are transformed through their palette, except for CMYK targets, which
//! need the index sample for black and therefore switch the image to
//! direct storage first.

use crate::error::{ColorError, ColorResult};
use crate::pixels::for_each_color;
use crate::storage::set_image_storage_class;
use pixattr_core::{Colorspace, Image, Pixel, Quantum, Session, StorageClass};

const LUMA_RED: f64 = 0.298839;
const LUMA_GREEN: f64 = 0.586811;
const LUMA_BLUE: f64 = 0.114350;

/// Nonlinear sRGB in `[0, 1]`.
type Rgb = [f64; 3];

fn srgb_to_linear(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(v: f64) -> f64 {
    if v <= 0.0031308 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Rec. 601 luma of a normalized triple.
#[inline]
pub fn luma(rgb: [f64; 3]) -> f64 {
    LUMA_RED * rgb[0] + LUMA_GREEN * rgb[1] + LUMA_BLUE * rgb[2]
}

#[inline]
fn normalize(v: Quantum, qr: Quantum) -> f64 {
    v as f64 / qr as f64
}

#[inline]
fn to_quantum(v: f64, qr: Quantum) -> Quantum {
    (v.clamp(0.0, 1.0) * qr as f64).round() as Quantum
}

/// Colorspaces whose samples are already nonlinear sRGB.
fn holds_srgb(colorspace: Colorspace) -> bool {
    matches!(
        colorspace,
        Colorspace::Srgb | Colorspace::Transparent | Colorspace::Undefined
    )
}

fn supported(colorspace: Colorspace) -> bool {
    holds_srgb(colorspace)
        || matches!(
            colorspace,
            Colorspace::Rgb | Colorspace::Gray | Colorspace::LinearGray | Colorspace::Cmyk
        )
}

/// Whether moving between the two colorspaces leaves every sample as is.
fn relabel_only(from: Colorspace, to: Colorspace) -> bool {
    (holds_srgb(from) || from == Colorspace::Gray) && holds_srgb(to)
}

fn decode(colorspace: Colorspace, pixel: &Pixel, qr: Quantum) -> Rgb {
    let [r, g, b] = [pixel.red, pixel.green, pixel.blue].map(|v| normalize(v, qr));
    match colorspace {
        Colorspace::Rgb | Colorspace::LinearGray => {
            [linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b)]
        }
        Colorspace::Cmyk => {
            let k = normalize(pixel.index, qr);
            [r, g, b].map(|c| 1.0 - (c * (1.0 - k) + k))
        }
        _ => [r, g, b],
    }
}

fn encode(colorspace: Colorspace, rgb: Rgb, pixel: &mut Pixel, qr: Quantum) {
    let [red, green, blue] = match colorspace {
        Colorspace::Rgb => rgb.map(srgb_to_linear),
        Colorspace::Gray => [luma(rgb); 3],
        Colorspace::LinearGray => [luma(rgb.map(srgb_to_linear)); 3],
        Colorspace::Cmyk => {
            let cmy = rgb.map(|v| 1.0 - v);
            let k = cmy[0].min(cmy[1]).min(cmy[2]);
            pixel.index = to_quantum(k, qr);
            if k >= 1.0 - f64::EPSILON {
                [0.0; 3]
            } else {
                cmy.map(|c| (c - k) / (1.0 - k))
            }
        }
        _ => rgb,
    };
    pixel.red = to_quantum(red, qr);
    pixel.green = to_quantum(green, qr);
    pixel.blue = to_quantum(blue, qr);
}

/// Convert one pixel's color samples between colorspaces.
///
/// Gray pixels keep their exact sample value when converted to gray.
pub fn convert_pixel(pixel: &mut Pixel, from: Colorspace, to: Colorspace, qr: Quantum) {
    if from == to || relabel_only(from, to) {
        return;
    }
    if to == Colorspace::Gray && (holds_srgb(from) || from == Colorspace::Gray) && pixel.is_gray()
    {
        return;
    }
    let rgb = decode(from, pixel, qr);
    if from == Colorspace::Cmyk {
        pixel.index = 0;
    }
    encode(to, rgb, pixel, qr);
}

/// Transform the image's samples into `target` and retag it.
///
/// # Errors
///
/// Returns [`ColorError::UnsupportedTransform`] before touching any pixel
/// when either colorspace is not supported, or a core error if a row
/// cannot be fetched or synced.
pub fn transform_colorspace(
    image: &mut Image,
    target: Colorspace,
    session: &Session,
) -> ColorResult<()> {
    let source = image.colorspace();
    tracing::trace!(filename = image.filename(), ?source, ?target, "transform_colorspace");
    if source == target {
        return Ok(());
    }
    if !supported(source) || !supported(target) {
        return Err(ColorError::UnsupportedTransform {
            from: source,
            to: target,
        });
    }
    if relabel_only(source, target) {
        image.set_colorspace(target);
        return Ok(());
    }

    if target == Colorspace::Cmyk && image.storage_class() == StorageClass::Indexed {
        tracing::debug!("leaving indexed storage for a separation colorspace");
        set_image_storage_class(image, StorageClass::Direct, session)?;
    }
    let qr = image.quantum_range();
    for_each_color(image, session, |pixel| {
        convert_pixel(pixel, source, target, qr)
    })?;
    image.set_colorspace(target);
    Ok(())
}
