//! Channel depth probing and rescaling
//!
//! The *depth* of a channel set is the smallest bit count `d` such that
//! every sample survives a round trip quantum -> `d` bits -> quantum
//! unchanged. Probing finds that depth; rescaling forces samples onto a
//! given depth.
//!
//! Two strategies are chosen once per call:
//!
//! - **table**: when the quantum range fits [`MAX_MAP`], a per-value table
//!   is built up front and each sample costs one lookup
//! - **direct**: otherwise each sample is tested, resuming from the depth
//!   already established by earlier samples
//!
//! Rows are scanned in parallel; each worker keeps its own running depth
//! and the results are combined with `max`, so the answer does not depend
//! on row order.

use crate::error::{AnalysisError, AnalysisResult};
use pixattr_core::{
    Channel, ChannelMask, Colorspace, Error, Image, MAX_MAP, Pixel, Quantum, Session,
    StorageClass, acquire_scratch, is_at_depth, minimal_depth_from, requantize,
};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// How a probe maps samples to depths.
enum ProbeStrategy {
    /// Minimal depth of every value in `0..=QuantumRange`.
    Table(Vec<u32>),
    Direct,
}

impl ProbeStrategy {
    fn select(image: &Image, session: &Session) -> Self {
        let qr = image.quantum_range();
        if qr > MAX_MAP {
            tracing::debug!(quantum_range = qr, "depth probe: direct strategy");
            return ProbeStrategy::Direct;
        }
        tracing::debug!(quantum_range = qr, "depth probe: table strategy");
        let max_depth = image.quantum_depth().bits();
        let mut table: Vec<u32> = acquire_scratch(session.sink(), qr as usize + 1, "depth map");
        for (value, slot) in table.iter_mut().enumerate() {
            *slot = minimal_depth_from(value as Quantum, 1, max_depth, qr);
        }
        ProbeStrategy::Table(table)
    }

    /// Raise `depth` until every channel of `pixel` in `mask` is exact.
    #[inline]
    fn widen(
        &self,
        pixel: &Pixel,
        mask: ChannelMask,
        depth: u32,
        max_depth: u32,
        qr: Quantum,
    ) -> u32 {
        match self {
            ProbeStrategy::Table(table) => mask.channels().fold(depth, |d, channel| {
                d.max(table[pixel.channel(channel).min(qr) as usize])
            }),
            ProbeStrategy::Direct => widen_direct(pixel, mask, depth, max_depth, qr),
        }
    }
}

fn widen_direct(pixel: &Pixel, mask: ChannelMask, depth: u32, max_depth: u32, qr: Quantum) -> u32 {
    let mut depth = depth;
    while depth < max_depth {
        if mask
            .channels()
            .all(|channel| is_at_depth(pixel.channel(channel), depth, qr))
        {
            break;
        }
        depth += 1;
    }
    depth
}

/// Channels of `mask` that carry data in this image.
///
/// Opacity needs a matte image; the index sample is a channel only in the
/// CMYK separation space.
fn effective_channels(image: &Image, mask: ChannelMask) -> ChannelMask {
    let mut mask = mask;
    if !image.matte() {
        mask = mask.without(Channel::Opacity);
    }
    if image.colorspace() != Colorspace::Cmyk {
        mask = mask.without(Channel::Index);
    }
    mask
}

/// Minimal depth at which every selected channel of every pixel is exact.
///
/// Opaque indexed images are answered from the palette alone (red, green
/// and blue only). Otherwise every row is read. The result is in
/// `1..=quantum_depth`; an empty mask yields 1.
///
/// # Errors
///
/// Returns an error if a row cannot be read or the worker pool cannot be
/// started.
///
/// # Examples
///
/// ```
/// use pixattr_analysis::get_image_channel_depth;
/// use pixattr_core::{ChannelMask, Image, Pixel, QuantumDepth, Session};
///
/// let image = Image::from_fn(4, 4, QuantumDepth::Q16, |x, _| {
///     Pixel::gray(if x % 2 == 0 { 0 } else { 65535 })
/// })
/// .unwrap();
/// let depth = get_image_channel_depth(&image, ChannelMask::RGB, &Session::default()).unwrap();
/// assert_eq!(depth, 1);
/// ```
pub fn get_image_channel_depth(
    image: &Image,
    channels: ChannelMask,
    session: &Session,
) -> AnalysisResult<u32> {
    tracing::trace!(filename = image.filename(), "get_image_channel_depth");
    let max_depth = image.quantum_depth().bits();
    let qr = image.quantum_range();

    if image.storage_class() == StorageClass::Indexed && !image.matte() {
        if let Some(palette) = image.palette() {
            tracing::debug!(entries = palette.len(), "depth probe: palette shortcut");
            let mask = channels & ChannelMask::RGB;
            let pool = session.worker_pool(palette.len())?;
            let depth = pool.install(|| {
                palette
                    .entries()
                    .par_iter()
                    .fold(|| 1u32, |d, entry| widen_direct(entry, mask, d, max_depth, qr))
                    .reduce(|| 1, u32::max)
            });
            return Ok(depth);
        }
    }

    let strategy = ProbeStrategy::select(image, session);
    let mask = effective_channels(image, channels);
    let view = image.read_view();
    let rows = image.rows();
    let pool = session.worker_pool(rows as usize)?;
    let done = AtomicBool::new(false);

    let depth = pool.install(|| {
        (0..rows)
            .into_par_iter()
            .try_fold(
                || (1u32, Vec::new()),
                |(mut depth, mut row), y| {
                    if done.load(Ordering::Relaxed) {
                        return Ok((depth, row));
                    }
                    view.read_row(y, &mut row)?;
                    for pixel in &row {
                        depth = strategy.widen(pixel, mask, depth, max_depth, qr);
                    }
                    if depth >= max_depth {
                        done.store(true, Ordering::Relaxed);
                    }
                    Ok::<_, Error>((depth, row))
                },
            )
            .map(|acc| acc.map(|(depth, _)| depth))
            .try_reduce(|| 1, |a, b| Ok(a.max(b)))
    })?;
    Ok(depth)
}

/// Depth over all composite channels.
pub fn get_image_depth(image: &Image, session: &Session) -> AnalysisResult<u32> {
    get_image_channel_depth(image, ChannelMask::COMPOSITE, session)
}

/// The recorded depth rounded up to a storage depth of 8, 16, 32 or 64.
///
/// With `constrain`, the result is capped at the image's quantum depth.
pub fn image_quantum_depth(image: &Image, constrain: bool) -> u32 {
    let depth = match image.depth() {
        0..=8 => 8,
        9..=16 => 16,
        17..=32 => 32,
        _ => 64,
    };
    if constrain {
        depth.min(image.quantum_depth().bits())
    } else {
        depth
    }
}

/// Requantize the selected channels of every pixel to `depth` bits.
///
/// When `depth` is at least the quantum depth only the recorded depth
/// changes. Indexed images have their palette rescaled and pixels
/// refreshed from it. The recorded depth is updated only after every row
/// has been synced.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidDepth`] for a depth outside `1..=64`,
/// or a core error if a row cannot be fetched or synced. Rows already
/// synced before the failure keep their new values.
pub fn set_image_channel_depth(
    image: &mut Image,
    channels: ChannelMask,
    depth: u32,
    session: &Session,
) -> AnalysisResult<()> {
    tracing::trace!(filename = image.filename(), depth, "set_image_channel_depth");
    if depth == 0 || depth > 64 {
        return Err(AnalysisError::InvalidDepth(depth));
    }
    let max_depth = image.quantum_depth().bits();
    if depth >= max_depth {
        image.set_depth(depth);
        return Ok(());
    }
    let qr = image.quantum_range();

    if image.storage_class() == StorageClass::Indexed && image.palette().is_some() {
        let mask = channels & (ChannelMask::RGB | ChannelMask::OPACITY);
        let entries = image.palette().map_or(0, |p| p.len());
        let pool = session.worker_pool(entries)?;
        if let Some(palette) = image.palette_mut() {
            tracing::debug!(entries, "rescaling palette");
            pool.install(|| {
                palette.entries_mut().par_iter_mut().for_each(|entry| {
                    for channel in mask.channels() {
                        let sample = entry.channel_mut(channel);
                        *sample = requantize(*sample, depth, qr);
                    }
                })
            });
        }
        image.sync_from_palette(session)?;
        image.set_depth(depth);
        return Ok(());
    }

    let mask = effective_channels(image, channels).without(Channel::Index);
    let table = if qr <= MAX_MAP {
        tracing::debug!("depth rescale: table strategy");
        let mut table: Vec<Quantum> =
            acquire_scratch(session.sink(), qr as usize + 1, "depth map");
        for (value, slot) in table.iter_mut().enumerate() {
            *slot = requantize(value as Quantum, depth, qr);
        }
        Some(table)
    } else {
        tracing::debug!("depth rescale: direct strategy");
        None
    };
    let rescale = |sample: Quantum| match &table {
        Some(table) => table[sample.min(qr) as usize],
        None => requantize(sample, depth, qr),
    };

    let rows = image.rows();
    let pool = session.worker_pool(rows as usize)?;
    let view = image.write_view();
    pool.install(|| {
        (0..rows).into_par_iter().try_for_each(|y| {
            let mut row = view.fetch_row(y)?;
            for pixel in row.pixels_mut() {
                for channel in mask.channels() {
                    let sample = pixel.channel_mut(channel);
                    *sample = rescale(*sample);
                }
            }
            view.sync(&row)
        })
    })?;
    image.set_depth(depth);
    Ok(())
}

/// [`set_image_channel_depth`] over all composite channels.
pub fn set_image_depth(image: &mut Image, depth: u32, session: &Session) -> AnalysisResult<()> {
    set_image_channel_depth(image, ChannelMask::COMPOSITE, depth, session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixattr_core::{Palette, QuantumDepth, ResourceLimits};

    fn session() -> Session {
        Session::new(ResourceLimits::new(4))
    }

    #[test]
    fn test_quantum_depth_rounding() {
        let mut image = Image::new(1, 1, QuantumDepth::Q16).unwrap();
        image.set_depth(1);
        assert_eq!(image_quantum_depth(&image, true), 8);
        image.set_depth(12);
        assert_eq!(image_quantum_depth(&image, true), 16);
        image.set_depth(20);
        assert_eq!(image_quantum_depth(&image, false), 32);
        assert_eq!(image_quantum_depth(&image, true), 16);
    }

    #[test]
    fn test_probe_table_and_direct_agree() {
        // 85 needs 2 bits at Q8; 0x5555 needs 2 bits at Q16 and Q32 uses
        // the direct path
        let q8 = Image::from_fn(3, 3, QuantumDepth::Q8, |_, _| Pixel::gray(85)).unwrap();
        assert_eq!(get_image_depth(&q8, &session()).unwrap(), 2);
        let q32 = Image::from_fn(3, 3, QuantumDepth::Q32, |_, _| Pixel::gray(0x5555_5555))
            .unwrap();
        assert_eq!(get_image_depth(&q32, &session()).unwrap(), 2);
    }

    #[test]
    fn test_opacity_ignored_without_matte() {
        let mut image =
            Image::from_fn(2, 2, QuantumDepth::Q8, |_, _| Pixel::rgbo(0, 0, 0, 1)).unwrap();
        assert_eq!(get_image_depth(&image, &session()).unwrap(), 1);
        image.set_matte(true);
        assert_eq!(get_image_depth(&image, &session()).unwrap(), 8);
    }

    #[test]
    fn test_set_depth_requantizes() {
        let mut image =
            Image::from_fn(2, 1, QuantumDepth::Q8, |x, _| Pixel::gray(u64::from(x) * 100))
                .unwrap();
        set_image_depth(&mut image, 1, &session()).unwrap();
        assert_eq!(image.depth(), 1);
        assert_eq!(image.get_pixel(0, 0).unwrap(), Pixel::gray(0));
        assert_eq!(image.get_pixel(1, 0).unwrap(), Pixel::gray(0));
        assert_eq!(get_image_depth(&image, &session()).unwrap(), 1);
    }

    #[test]
    fn test_set_depth_at_or_above_quantum_depth_is_metadata_only() {
        let mut image = Image::from_fn(1, 1, QuantumDepth::Q8, |_, _| Pixel::gray(7)).unwrap();
        set_image_depth(&mut image, 16, &session()).unwrap();
        assert_eq!(image.depth(), 16);
        assert_eq!(image.get_pixel(0, 0).unwrap(), Pixel::gray(7));
        assert!(set_image_depth(&mut image, 0, &session()).is_err());
    }

    #[test]
    fn test_set_depth_indexed_rescales_palette() {
        let palette = Palette::from_colors([Pixel::gray(10), Pixel::gray(250)]).unwrap();
        let mut image =
            Image::from_indexes(2, 2, QuantumDepth::Q8, palette, |x, _| x as usize).unwrap();
        set_image_depth(&mut image, 1, &session()).unwrap();
        let entries = image.palette().unwrap().entries();
        assert_eq!(entries[0].red, 0);
        assert_eq!(entries[1].red, 255);
        assert_eq!(image.get_pixel(1, 1).unwrap().red, 255);
        assert_eq!(image.get_pixel(1, 1).unwrap().index, 1);
    }
}
