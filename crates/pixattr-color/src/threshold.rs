//! Contrast normalization and bilevel thresholding

use crate::error::ColorResult;
use crate::pixels::{colors, for_each_color};
use pixattr_core::{Channel, ChannelMask, Image, OPAQUE_OPACITY, Pixel, Quantum, Session};
use rayon::prelude::*;

/// Per-channel sample extremes over red, green and blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChannelExtents {
    min: [Quantum; 3],
    max: [Quantum; 3],
}

impl ChannelExtents {
    fn empty() -> Self {
        Self {
            min: [Quantum::MAX; 3],
            max: [0; 3],
        }
    }

    fn add(mut self, pixel: &Pixel) -> Self {
        for (i, v) in [pixel.red, pixel.green, pixel.blue].into_iter().enumerate() {
            self.min[i] = self.min[i].min(v);
            self.max[i] = self.max[i].max(v);
        }
        self
    }

    fn merge(mut self, other: Self) -> Self {
        for i in 0..3 {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
        self
    }
}

/// Linear stretch of `v` from `[lo, hi]` onto `[0, qr]`.
#[inline]
fn stretch(v: Quantum, lo: Quantum, hi: Quantum, qr: Quantum) -> Quantum {
    if hi <= lo {
        return v;
    }
    let v = v.clamp(lo, hi);
    let num = u128::from(v - lo) * u128::from(qr) + u128::from(hi - lo) / 2;
    (num / u128::from(hi - lo)) as Quantum
}

/// Stretch each color channel so its darkest sample maps to 0 and its
/// brightest to QuantumRange.
///
/// Channels holding a single value are left alone.
///
/// # Errors
///
/// Returns a core error if a row cannot be read, fetched or synced.
pub fn normalize_image(image: &mut Image, session: &Session) -> ColorResult<()> {
    tracing::trace!(filename = image.filename(), "normalize_image");
    let qr = image.quantum_range();
    let samples = colors(image)?;
    let pool = session.worker_pool(samples.len())?;
    let extents = pool.install(|| {
        samples
            .par_iter()
            .fold(ChannelExtents::empty, ChannelExtents::add)
            .reduce(ChannelExtents::empty, ChannelExtents::merge)
    });
    tracing::debug!(?extents, "normalize");
    let ChannelExtents { min, max } = extents;
    // single-valued or already full-range channels map onto themselves
    if (0..3).all(|i| max[i] <= min[i] || (min[i] == 0 && max[i] == qr)) {
        return Ok(());
    }
    for_each_color(image, session, |pixel| {
        pixel.red = stretch(pixel.red, min[0], max[0], qr);
        pixel.green = stretch(pixel.green, min[1], max[1], qr);
        pixel.blue = stretch(pixel.blue, min[2], max[2], qr);
    })
}

/// Force the selected channels to 0 or QuantumRange.
///
/// Color samples at or below `threshold` become 0, the rest QuantumRange.
/// The opacity channel is thresholded on alpha: alpha at or below
/// `threshold` becomes fully transparent, the rest fully opaque.
///
/// # Errors
///
/// Returns a core error if a row cannot be fetched or synced.
pub fn bilevel_image(
    image: &mut Image,
    channels: ChannelMask,
    threshold: f64,
    session: &Session,
) -> ColorResult<()> {
    tracing::trace!(filename = image.filename(), threshold, "bilevel_image");
    let qr = image.quantum_range();
    let level = |v: Quantum| if v as f64 <= threshold { 0 } else { qr };
    for_each_color(image, session, |pixel| {
        for channel in channels.channels() {
            match channel {
                Channel::Opacity => {
                    pixel.opacity = if pixel.alpha(qr) as f64 <= threshold {
                        qr
                    } else {
                        OPAQUE_OPACITY
                    };
                }
                Channel::Index => {}
                _ => {
                    let sample = pixel.channel_mut(channel);
                    *sample = level(*sample);
                }
            }
        }
    })
}
