//! Image type enforcement
//!
//! [`set_image_type`] rewrites an image so that it actually is of the
//! requested type. Each target runs a fixed recipe of color operations:
//!
//! | target                 | recipe |
//! |------------------------|--------|
//! | `Bilevel`              | gray, normalize, threshold at half range, 2 gray colors |
//! | `Grayscale[Matte]`     | gray, alpha off (opaque alpha on) |
//! | `Palette`              | sRGB, alpha off, 256 colors unless already a palette |
//! | `PaletteMatte`         | sRGB, opaque alpha, 256 colors including alpha |
//! | `PaletteBilevelMatte`  | sRGB, opaque alpha, alpha threshold at half range, 256 colors |
//! | `TrueColor[Matte]`     | sRGB, direct storage, alpha off (opaque alpha on) |
//! | `ColorSeparation[Matte]` | CMYK, direct storage, alpha off (opaque alpha on) |
//!
//! "Opaque alpha" only materializes an alpha channel when the image has
//! none. Applying the same target twice changes nothing the second time.
//!
//! The recipe is not transactional: when a step fails the remaining steps
//! are skipped and the image keeps the changes of the steps that already
//! ran. The cached type is updated only when every step succeeded, and is
//! then exactly the requested target.

use crate::alpha::{AlphaChannel, set_image_alpha_channel};
use crate::colorspace::transform_colorspace;
use crate::error::ColorResult;
use crate::quantize::{QuantizeOptions, quantize_image};
use crate::storage::set_image_storage_class;
use crate::threshold::{bilevel_image, normalize_image};
use pixattr_core::{ChannelMask, Colorspace, Image, ImageType, Session, StorageClass};

/// Largest palette produced by the palette recipes.
const PALETTE_COLORS: usize = 256;

/// The color operations type enforcement is built from.
///
/// [`StandardColorOps`] runs this crate's implementations; other
/// implementations can intercept or replace individual steps.
pub trait ColorOps {
    fn transform_colorspace(
        &self,
        image: &mut Image,
        colorspace: Colorspace,
        session: &Session,
    ) -> ColorResult<()>;

    fn normalize(&self, image: &mut Image, session: &Session) -> ColorResult<()>;

    fn bilevel(
        &self,
        image: &mut Image,
        channels: ChannelMask,
        threshold: f64,
        session: &Session,
    ) -> ColorResult<()>;

    fn set_alpha_channel(
        &self,
        image: &mut Image,
        mode: AlphaChannel,
        session: &Session,
    ) -> ColorResult<()>;

    fn quantize(
        &self,
        image: &mut Image,
        options: &QuantizeOptions,
        session: &Session,
    ) -> ColorResult<()>;

    fn set_storage_class(
        &self,
        image: &mut Image,
        storage_class: StorageClass,
        session: &Session,
    ) -> ColorResult<()>;
}

/// [`ColorOps`] backed by this crate's color functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardColorOps;

impl ColorOps for StandardColorOps {
    fn transform_colorspace(
        &self,
        image: &mut Image,
        colorspace: Colorspace,
        session: &Session,
    ) -> ColorResult<()> {
        transform_colorspace(image, colorspace, session)
    }

    fn normalize(&self, image: &mut Image, session: &Session) -> ColorResult<()> {
        normalize_image(image, session)
    }

    fn bilevel(
        &self,
        image: &mut Image,
        channels: ChannelMask,
        threshold: f64,
        session: &Session,
    ) -> ColorResult<()> {
        bilevel_image(image, channels, threshold, session)
    }

    fn set_alpha_channel(
        &self,
        image: &mut Image,
        mode: AlphaChannel,
        session: &Session,
    ) -> ColorResult<()> {
        set_image_alpha_channel(image, mode, session)
    }

    fn quantize(
        &self,
        image: &mut Image,
        options: &QuantizeOptions,
        session: &Session,
    ) -> ColorResult<()> {
        quantize_image(image, options, session)
    }

    fn set_storage_class(
        &self,
        image: &mut Image,
        storage_class: StorageClass,
        session: &Session,
    ) -> ColorResult<()> {
        set_image_storage_class(image, storage_class, session)
    }
}

/// Rewrite the image to be of type `target` using [`StandardColorOps`].
///
/// # Errors
///
/// Returns the error of the first failing step; see the module
/// documentation for what is left behind.
///
/// # Examples
///
/// ```
/// use pixattr_color::set_image_type;
/// use pixattr_core::{Image, ImageType, Pixel, QuantumDepth, Session};
///
/// let mut image = Image::from_fn(8, 8, QuantumDepth::Q8, |x, y| {
///     Pixel::rgb(u64::from(x) * 30, u64::from(y) * 30, 90)
/// })
/// .unwrap();
/// set_image_type(&mut image, ImageType::Bilevel, &Session::default()).unwrap();
/// assert_eq!(image.image_type(), ImageType::Bilevel);
/// assert!(image.pixels().unwrap().iter().all(|p| p.is_monochrome(255)));
/// ```
pub fn set_image_type(image: &mut Image, target: ImageType, session: &Session) -> ColorResult<()> {
    set_image_type_with(image, target, &StandardColorOps, session)
}

/// Rewrite the image to be of type `target` using `ops` for every step.
pub fn set_image_type_with(
    image: &mut Image,
    target: ImageType,
    ops: &impl ColorOps,
    session: &Session,
) -> ColorResult<()> {
    tracing::trace!(filename = image.filename(), ?target, "set_image_type");
    let half_range = image.quantum_range() as f64 / 2.0;
    let dither = image.dither();
    let quantize = |number_colors, colorspace| QuantizeOptions {
        number_colors,
        colorspace,
        dither,
    };

    match target {
        ImageType::Bilevel => {
            to_gray(image, ops, session)?;
            ops.normalize(image, session)?;
            ops.bilevel(image, ChannelMask::RGB, half_range, session)?;
            image.set_matte(false);
            ops.quantize(image, &quantize(2, Some(Colorspace::Gray)), session)?;
        }
        ImageType::Grayscale => {
            to_gray(image, ops, session)?;
            image.set_matte(false);
        }
        ImageType::GrayscaleMatte => {
            to_gray(image, ops, session)?;
            ensure_alpha(image, ops, session)?;
        }
        ImageType::Palette => {
            to_srgb(image, ops, session)?;
            image.set_matte(false);
            let is_palette = image.storage_class() == StorageClass::Indexed
                && image
                    .palette()
                    .is_some_and(|p| p.len() <= PALETTE_COLORS);
            if !is_palette {
                ops.quantize(image, &quantize(PALETTE_COLORS, None), session)?;
            }
        }
        ImageType::PaletteBilevelMatte => {
            to_srgb(image, ops, session)?;
            ensure_alpha(image, ops, session)?;
            ops.bilevel(image, ChannelMask::OPACITY, half_range, session)?;
            ops.quantize(image, &quantize(PALETTE_COLORS, None), session)?;
        }
        ImageType::PaletteMatte => {
            to_srgb(image, ops, session)?;
            ensure_alpha(image, ops, session)?;
            let options = quantize(PALETTE_COLORS, Some(Colorspace::Transparent));
            ops.quantize(image, &options, session)?;
        }
        ImageType::TrueColor | ImageType::TrueColorMatte => {
            to_srgb(image, ops, session)?;
            to_direct(image, ops, session)?;
            finish_alpha(image, target, ops, session)?;
        }
        ImageType::ColorSeparation | ImageType::ColorSeparationMatte => {
            if image.colorspace() != Colorspace::Cmyk {
                ops.transform_colorspace(image, Colorspace::Cmyk, session)?;
            }
            to_direct(image, ops, session)?;
            finish_alpha(image, target, ops, session)?;
        }
        ImageType::Optimize | ImageType::Undefined => {}
    }

    image.set_image_type(target);
    Ok(())
}

fn to_gray(image: &mut Image, ops: &impl ColorOps, session: &Session) -> ColorResult<()> {
    if image.colorspace().is_gray() {
        return Ok(());
    }
    ops.transform_colorspace(image, Colorspace::Gray, session)
}

fn to_srgb(image: &mut Image, ops: &impl ColorOps, session: &Session) -> ColorResult<()> {
    if image.colorspace().is_srgb_compatible() {
        return Ok(());
    }
    ops.transform_colorspace(image, Colorspace::Srgb, session)
}

fn to_direct(image: &mut Image, ops: &impl ColorOps, session: &Session) -> ColorResult<()> {
    if image.storage_class() == StorageClass::Direct {
        return Ok(());
    }
    ops.set_storage_class(image, StorageClass::Direct, session)
}

/// Give the image an opaque alpha channel unless it already has one.
fn ensure_alpha(image: &mut Image, ops: &impl ColorOps, session: &Session) -> ColorResult<()> {
    if image.matte() {
        return Ok(());
    }
    ops.set_alpha_channel(image, AlphaChannel::Opaque, session)
}

fn finish_alpha(
    image: &mut Image,
    target: ImageType,
    ops: &impl ColorOps,
    session: &Session,
) -> ColorResult<()> {
    if target.is_matte() {
        ensure_alpha(image, ops, session)
    } else {
        image.set_matte(false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ColorError;
    use pixattr_core::{Pixel, QuantumDepth};

    /// Standard operations, except that quantizing always fails.
    struct NoQuantize;

    impl ColorOps for NoQuantize {
        fn transform_colorspace(
            &self,
            image: &mut Image,
            colorspace: Colorspace,
            session: &Session,
        ) -> ColorResult<()> {
            StandardColorOps.transform_colorspace(image, colorspace, session)
        }

        fn normalize(&self, image: &mut Image, session: &Session) -> ColorResult<()> {
            StandardColorOps.normalize(image, session)
        }

        fn bilevel(
            &self,
            image: &mut Image,
            channels: ChannelMask,
            threshold: f64,
            session: &Session,
        ) -> ColorResult<()> {
            StandardColorOps.bilevel(image, channels, threshold, session)
        }

        fn set_alpha_channel(
            &self,
            image: &mut Image,
            mode: AlphaChannel,
            session: &Session,
        ) -> ColorResult<()> {
            StandardColorOps.set_alpha_channel(image, mode, session)
        }

        fn quantize(&self, _: &mut Image, _: &QuantizeOptions, _: &Session) -> ColorResult<()> {
            Err(ColorError::QuantizationError("disabled".into()))
        }

        fn set_storage_class(
            &self,
            image: &mut Image,
            storage_class: StorageClass,
            session: &Session,
        ) -> ColorResult<()> {
            StandardColorOps.set_storage_class(image, storage_class, session)
        }
    }

    fn colorful() -> Image {
        Image::from_fn(6, 4, QuantumDepth::Q8, |x, y| {
            Pixel::rgb(u64::from(x) * 40, u64::from(y) * 60, 200)
        })
        .unwrap()
    }

    #[test]
    fn test_failed_step_keeps_earlier_changes() {
        let session = Session::default();
        let mut image = colorful();
        let result = set_image_type_with(&mut image, ImageType::Bilevel, &NoQuantize, &session);
        assert!(matches!(result, Err(ColorError::QuantizationError(_))));
        // gray conversion and thresholding already happened
        assert_eq!(image.colorspace(), Colorspace::Gray);
        assert!(image.pixels().unwrap().iter().all(|p| p.is_monochrome(255)));
        // the cached type did not move
        assert_eq!(image.image_type(), ImageType::Undefined);
    }

    #[test]
    fn test_tag_is_verbatim() {
        let session = Session::default();
        let mut image = Image::new(3, 3, QuantumDepth::Q8).unwrap();
        set_image_type(&mut image, ImageType::Palette, &session).unwrap();
        assert_eq!(image.image_type(), ImageType::Palette);
        assert_eq!(image.storage_class(), StorageClass::Indexed);

        set_image_type(&mut image, ImageType::Optimize, &session).unwrap();
        assert_eq!(image.image_type(), ImageType::Optimize);
    }

    #[test]
    fn test_matte_targets_materialize_alpha() {
        let session = Session::default();
        let mut image = colorful();
        set_image_type(&mut image, ImageType::TrueColorMatte, &session).unwrap();
        assert!(image.matte());
        set_image_type(&mut image, ImageType::TrueColor, &session).unwrap();
        assert!(!image.matte());
    }

    #[test]
    fn test_unsupported_source_colorspace() {
        let session = Session::default();
        let mut image = colorful();
        image.set_colorspace(Colorspace::Lab);
        assert!(matches!(
            set_image_type(&mut image, ImageType::TrueColor, &session),
            Err(ColorError::UnsupportedTransform { .. })
        ));
        assert_eq!(image.image_type(), ImageType::Undefined);
    }
}
