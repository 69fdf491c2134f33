//! Storage class changes

use crate::error::ColorResult;
use crate::pixels::for_each_pixel;
use crate::quantize::{QuantizeOptions, quantize_image};
use pixattr_core::{Colorspace, Image, MAX_PALETTE_SIZE, Session, StorageClass};

/// Switch the image between direct and indexed storage.
///
/// Going direct keeps every pixel's color, clears the index samples (they
/// hold black for separation images, which are never indexed) and drops
/// the palette. Going indexed builds a palette of the image's colors,
/// reducing them when there are more than a palette can hold.
///
/// # Errors
///
/// Returns a core error if a row cannot be fetched or synced.
pub fn set_image_storage_class(
    image: &mut Image,
    storage_class: StorageClass,
    session: &Session,
) -> ColorResult<()> {
    tracing::trace!(filename = image.filename(), ?storage_class, "set_image_storage_class");
    if image.storage_class() == storage_class {
        return Ok(());
    }
    match storage_class {
        StorageClass::Direct => {
            if image.colorspace() != Colorspace::Cmyk {
                for_each_pixel(image, session, |pixel| pixel.index = 0)?;
            }
            image.set_palette(None);
            image.set_storage_class(StorageClass::Direct);
        }
        StorageClass::Indexed => {
            let options = QuantizeOptions {
                number_colors: MAX_PALETTE_SIZE,
                ..QuantizeOptions::default()
            };
            quantize_image(image, &options, session)?;
        }
    }
    Ok(())
}
