//! Alpha channel control

use crate::error::ColorResult;
use crate::pixels::for_each_color;
use pixattr_core::{Image, OPAQUE_OPACITY, Session};

/// What to do with an image's alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaChannel {
    /// Turn matte on and make every pixel fully opaque.
    Opaque,
    /// Turn matte on and make every pixel fully transparent.
    Transparent,
    /// Turn matte on, keeping opacity samples.
    Activate,
    /// Turn matte off, keeping opacity samples.
    Deactivate,
}

/// Materialize, reset or toggle the alpha channel.
///
/// # Errors
///
/// Returns a core error if a row cannot be fetched or synced.
pub fn set_image_alpha_channel(
    image: &mut Image,
    mode: AlphaChannel,
    session: &Session,
) -> ColorResult<()> {
    tracing::trace!(filename = image.filename(), ?mode, "set_image_alpha_channel");
    let qr = image.quantum_range();
    match mode {
        AlphaChannel::Opaque => {
            for_each_color(image, session, |pixel| pixel.opacity = OPAQUE_OPACITY)?;
        }
        AlphaChannel::Transparent => {
            for_each_color(image, session, |pixel| pixel.opacity = qr)?;
        }
        AlphaChannel::Activate => {}
        AlphaChannel::Deactivate => {
            image.set_matte(false);
            return Ok(());
        }
    }
    image.set_matte(true);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixattr_core::{Pixel, QuantumDepth};

    #[test]
    fn test_opaque_and_transparent() {
        let session = Session::default();
        let mut image =
            Image::from_fn(3, 3, QuantumDepth::Q8, |x, _| Pixel::rgbo(5, 5, 5, u64::from(x))).unwrap();
        set_image_alpha_channel(&mut image, AlphaChannel::Opaque, &session).unwrap();
        assert!(image.matte());
        assert!(image.pixels().unwrap().iter().all(|p| p.opacity == OPAQUE_OPACITY));

        set_image_alpha_channel(&mut image, AlphaChannel::Transparent, &session).unwrap();
        assert!(image.pixels().unwrap().iter().all(|p| p.opacity == 255));

        set_image_alpha_channel(&mut image, AlphaChannel::Deactivate, &session).unwrap();
        assert!(!image.matte());
        assert_eq!(image.get_pixel(0, 0).unwrap().opacity, 255);
    }
}
