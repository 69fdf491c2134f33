//! Image type classification
//!
//! The classification is an ordered decision list:
//!
//! 1. CMYK colorspace: `ColorSeparation`
//! 2. every pixel black or white: `Bilevel`
//! 3. every pixel gray: `Grayscale`
//! 4. at most 256 colors: `Palette`
//! 5. otherwise `TrueColor`
//!
//! each with a `Matte` variant where one exists. The `get_*` / `is_*`
//! functions trust the cached type and storage class; the `identify_*`
//! functions re-derive the answer by scanning pixels in parallel, with a
//! shared flag letting workers skip rows once the answer is settled.

use crate::error::AnalysisResult;
use pixattr_core::{
    Colorspace, Error, Image, ImageType, OPAQUE_OPACITY, Pixel, Quantum, Session, StorageClass,
};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Largest color count of a palette image.
pub const MAX_PALETTE_COLORS: usize = 256;

/// Cached type says the image is gray.
pub fn is_gray_image(image: &Image) -> bool {
    matches!(
        image.image_type(),
        ImageType::Bilevel | ImageType::Grayscale | ImageType::GrayscaleMatte
    )
}

/// Cached type says the image is bilevel.
pub fn is_monochrome_image(image: &Image) -> bool {
    image.image_type() == ImageType::Bilevel
}

/// Indexed storage with a palette of at most 256 entries.
pub fn is_palette_image(image: &Image) -> bool {
    image.storage_class() == StorageClass::Indexed
        && image
            .palette()
            .is_some_and(|p| p.len() <= MAX_PALETTE_COLORS)
}

/// Classify from cached attributes only; no pixels are read.
pub fn get_image_type(image: &Image) -> ImageType {
    tracing::trace!(filename = image.filename(), "get_image_type");
    let matte = image.matte();
    if image.colorspace() == Colorspace::Cmyk {
        return ImageType::ColorSeparation.with_matte(matte);
    }
    if is_monochrome_image(image) {
        return ImageType::Bilevel;
    }
    if is_gray_image(image) {
        return ImageType::Grayscale.with_matte(matte);
    }
    if is_palette_image(image) {
        return ImageType::Palette.with_matte(matte);
    }
    ImageType::TrueColor.with_matte(matte)
}

/// Read every row in parallel, skipping rows once `settled` reports true.
fn scan_rows(
    image: &Image,
    session: &Session,
    settled: impl Fn() -> bool + Sync,
    visit: impl Fn(&[Pixel]) + Sync,
) -> AnalysisResult<()> {
    let view = image.read_view();
    let rows = image.rows();
    let pool = session.worker_pool(rows as usize)?;
    pool.install(|| {
        (0..rows).into_par_iter().try_for_each_init(Vec::new, |row, y| {
            if settled() {
                return Ok(());
            }
            view.read_row(y, row)?;
            visit(row);
            Ok::<_, Error>(())
        })
    })?;
    Ok(())
}

/// Whether every pixel is pure black or pure white.
///
/// A cached `Bilevel` type answers immediately; non-sRGB-compatible
/// colorspaces are never monochrome.
pub fn identify_image_monochrome(image: &Image, session: &Session) -> AnalysisResult<bool> {
    tracing::trace!(filename = image.filename(), "identify_image_monochrome");
    if image.image_type() == ImageType::Bilevel {
        return Ok(true);
    }
    if !image.colorspace().is_srgb_compatible() {
        return Ok(false);
    }
    let qr = image.quantum_range();
    let monochrome = AtomicBool::new(true);
    scan_rows(
        image,
        session,
        || !monochrome.load(Ordering::Relaxed),
        |row| {
            if !row.iter().all(|p| p.is_monochrome(qr)) {
                monochrome.store(false, Ordering::Relaxed);
            }
        },
    )?;
    Ok(monochrome.into_inner())
}

// Gray scan states, ordered so that combining two workers is a max.
const GRAY_BILEVEL: u8 = 0;
const GRAY_GRAYSCALE: u8 = 1;
const GRAY_UNDEFINED: u8 = 2;

fn gray_state(row: &[Pixel], qr: Quantum) -> u8 {
    let mut state = GRAY_BILEVEL;
    for pixel in row {
        if !pixel.is_gray() {
            return GRAY_UNDEFINED;
        }
        if !pixel.is_monochrome(qr) {
            state = GRAY_GRAYSCALE;
        }
    }
    state
}

/// Scan for a gray type: `Bilevel`, `Grayscale`, `GrayscaleMatte`, or
/// `Undefined` when some pixel is not gray.
///
/// A cached gray type answers immediately; non-sRGB-compatible
/// colorspaces are `Undefined`. The matte suffix is added only when the
/// image has an alpha channel that is not fully opaque.
pub fn identify_image_gray(image: &Image, session: &Session) -> AnalysisResult<ImageType> {
    tracing::trace!(filename = image.filename(), "identify_image_gray");
    if is_gray_image(image) {
        return Ok(image.image_type());
    }
    if !image.colorspace().is_srgb_compatible() {
        return Ok(ImageType::Undefined);
    }
    let qr = image.quantum_range();
    let state = AtomicU8::new(GRAY_BILEVEL);
    scan_rows(
        image,
        session,
        || state.load(Ordering::Relaxed) == GRAY_UNDEFINED,
        |row| {
            state.fetch_max(gray_state(row, qr), Ordering::Relaxed);
        },
    )?;
    Ok(match state.into_inner() {
        GRAY_BILEVEL => ImageType::Bilevel,
        GRAY_GRAYSCALE => ImageType::Grayscale.with_matte(has_transparency(image, session)?),
        _ => ImageType::Undefined,
    })
}

/// Whether the image has at most 256 distinct colors.
///
/// Palette entries are full pixels at the image depth, so any color the
/// image holds fits a palette exactly and the count is the whole test.
/// Stops early once any worker has seen more than 256 colors.
pub fn identify_palette_image(image: &Image, session: &Session) -> AnalysisResult<bool> {
    tracing::trace!(filename = image.filename(), "identify_palette_image");
    if !image.colorspace().is_srgb_compatible() {
        return Ok(false);
    }
    if is_palette_image(image) {
        return Ok(true);
    }
    let matte = image.matte();
    let key = |p: &Pixel| (p.red, p.green, p.blue, if matte { p.opacity } else { 0 });

    let view = image.read_view();
    let rows = image.rows();
    let pool = session.worker_pool(rows as usize)?;
    let overflow = AtomicBool::new(false);
    let colors = pool.install(|| {
        (0..rows)
            .into_par_iter()
            .try_fold(
                || (HashSet::new(), Vec::new()),
                |(mut colors, mut row), y| {
                    if overflow.load(Ordering::Relaxed) {
                        return Ok((colors, row));
                    }
                    view.read_row(y, &mut row)?;
                    colors.extend(row.iter().map(key));
                    if colors.len() > MAX_PALETTE_COLORS {
                        overflow.store(true, Ordering::Relaxed);
                    }
                    Ok::<_, Error>((colors, row))
                },
            )
            .map(|acc| acc.map(|(colors, _)| colors))
            .try_reduce(HashSet::new, |mut a, b| {
                a.extend(b);
                Ok(a)
            })
    })?;
    Ok(!overflow.into_inner() && colors.len() <= MAX_PALETTE_COLORS)
}

/// Whether every pixel is fully opaque. Images without matte are opaque.
pub fn is_opaque_image(image: &Image, session: &Session) -> AnalysisResult<bool> {
    tracing::trace!(filename = image.filename(), "is_opaque_image");
    if !image.matte() {
        return Ok(true);
    }
    let opaque = AtomicBool::new(true);
    scan_rows(
        image,
        session,
        || !opaque.load(Ordering::Relaxed),
        |row| {
            if row.iter().any(|p| p.opacity != OPAQUE_OPACITY) {
                opaque.store(false, Ordering::Relaxed);
            }
        },
    )?;
    Ok(opaque.into_inner())
}

/// Matte flag set and at least one pixel not fully opaque.
fn has_transparency(image: &Image, session: &Session) -> AnalysisResult<bool> {
    Ok(image.matte() && !is_opaque_image(image, session)?)
}

/// Classify by scanning pixels.
///
/// Same decision order as [`get_image_type`], but each step is decided by
/// the pixels rather than cached attributes, and the matte suffix reflects
/// actual transparency.
///
/// # Errors
///
/// Returns an error if a row cannot be read or the worker pool cannot be
/// started.
pub fn identify_image_type(image: &Image, session: &Session) -> AnalysisResult<ImageType> {
    tracing::trace!(filename = image.filename(), "identify_image_type");
    if image.colorspace() == Colorspace::Cmyk {
        return Ok(ImageType::ColorSeparation.with_matte(has_transparency(image, session)?));
    }
    if identify_image_monochrome(image, session)? {
        return Ok(ImageType::Bilevel);
    }
    if identify_image_gray(image, session)? != ImageType::Undefined {
        return Ok(ImageType::Grayscale.with_matte(has_transparency(image, session)?));
    }
    if identify_palette_image(image, session)? {
        return Ok(ImageType::Palette.with_matte(has_transparency(image, session)?));
    }
    Ok(ImageType::TrueColor.with_matte(has_transparency(image, session)?))
}
