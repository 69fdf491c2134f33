//! Row-parallel pixel rewriting shared by the color operations.

use crate::error::ColorResult;
use pixattr_core::{Image, Pixel, Session, StorageClass};
use rayon::prelude::*;

/// Apply `op` to every pixel, one row per task, syncing each row before
/// the task ends.
pub(crate) fn for_each_pixel(
    image: &mut Image,
    session: &Session,
    op: impl Fn(&mut Pixel) + Sync,
) -> ColorResult<()> {
    let rows = image.rows();
    let pool = session.worker_pool(rows as usize)?;
    let view = image.write_view();
    pool.install(|| {
        (0..rows).into_par_iter().try_for_each(|y| {
            let mut row = view.fetch_row(y)?;
            row.pixels_mut().iter_mut().for_each(&op);
            view.sync(&row)
        })
    })?;
    Ok(())
}

/// Apply `op` to every color of the image.
///
/// Indexed images have their palette entries rewritten and the pixels
/// refreshed from the palette; direct images are rewritten pixel by pixel.
pub(crate) fn for_each_color(
    image: &mut Image,
    session: &Session,
    op: impl Fn(&mut Pixel) + Sync,
) -> ColorResult<()> {
    if image.storage_class() == StorageClass::Indexed {
        if let Some(palette) = image.palette_mut() {
            palette.entries_mut().iter_mut().for_each(&op);
            image.sync_from_palette(session)?;
            return Ok(());
        }
    }
    for_each_pixel(image, session, op)
}

/// Every color sample the image uses: palette entries for indexed images,
/// otherwise all pixels.
pub(crate) fn colors(image: &Image) -> ColorResult<Vec<Pixel>> {
    if image.storage_class() == StorageClass::Indexed {
        if let Some(palette) = image.palette() {
            return Ok(palette.entries().to_vec());
        }
    }
    Ok(image.pixels()?)
}
