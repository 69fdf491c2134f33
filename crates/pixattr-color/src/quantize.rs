//! Color quantization
//!
//! Reduces an image to indexed storage with at most `number_colors`
//! palette entries:
//!
//! - **exact**: the image already has few enough distinct colors, so the
//!   palette is exactly those colors
//! - **median cut**: otherwise, boxes in color space are split at the
//!   weighted median of their widest channel until there are enough boxes;
//!   each box contributes its weighted mean color
//!
//! When reducing, pixels can be mapped with Floyd-Steinberg error
//! diffusion instead of box membership. Both paths finish with a palette
//! sorted by color and holding only used entries, so quantizing an already
//! quantized image reproduces it sample for sample.

use crate::colorspace::transform_colorspace;
use crate::error::{ColorError, ColorResult};
use pixattr_core::{
    Colorspace, Error, Image, MAX_PALETTE_SIZE, OPAQUE_OPACITY, Palette, Pixel, Quantum, Session,
    StorageClass,
};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Red, green, blue, opacity.
type ColorKey = [Quantum; 4];

/// Options for [`quantize_image`]
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeOptions {
    /// Maximum number of colors in the output palette
    pub number_colors: usize,
    /// Colorspace to quantize in: `Gray` converts the image to gray first,
    /// `Transparent` makes opacity take part even without matte
    pub colorspace: Option<Colorspace>,
    /// Map pixels with Floyd-Steinberg error diffusion when reducing
    pub dither: bool,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            number_colors: 256,
            colorspace: None,
            dither: false,
        }
    }
}

#[inline]
fn color_key(pixel: &Pixel, with_alpha: bool) -> ColorKey {
    let opacity = if with_alpha {
        pixel.opacity
    } else {
        OPAQUE_OPACITY
    };
    [pixel.red, pixel.green, pixel.blue, opacity]
}

#[inline]
fn key_pixel(key: &ColorKey) -> Pixel {
    Pixel::rgbo(key[0], key[1], key[2], key[3])
}

/// Quantize the image into a palette of at most `options.number_colors`
/// entries and switch it to indexed storage.
///
/// # Errors
///
/// Returns [`ColorError::InvalidParameters`] if `number_colors` is 0 or
/// larger than a palette can hold, or a core error if the pixels cannot
/// be read or written back.
///
/// # Examples
///
/// ```
/// use pixattr_color::{QuantizeOptions, quantize_image};
/// use pixattr_core::{Image, Pixel, QuantumDepth, Session, StorageClass};
///
/// let mut image = Image::from_fn(16, 16, QuantumDepth::Q8, |x, y| {
///     Pixel::rgb(u64::from(x) * 16, u64::from(y) * 16, 128)
/// })
/// .unwrap();
/// let options = QuantizeOptions { number_colors: 8, ..Default::default() };
/// quantize_image(&mut image, &options, &Session::default()).unwrap();
/// assert_eq!(image.storage_class(), StorageClass::Indexed);
/// assert!(image.palette().unwrap().len() <= 8);
/// ```
pub fn quantize_image(
    image: &mut Image,
    options: &QuantizeOptions,
    session: &Session,
) -> ColorResult<()> {
    tracing::trace!(filename = image.filename(), ?options, "quantize_image");
    let n = options.number_colors;
    if n == 0 || n > MAX_PALETTE_SIZE {
        return Err(ColorError::InvalidParameters(format!(
            "number_colors must be between 1 and {MAX_PALETTE_SIZE}, got {n}"
        )));
    }
    if options.colorspace == Some(Colorspace::Gray) && !image.colorspace().is_gray() {
        transform_colorspace(image, Colorspace::Gray, session)?;
    }
    let with_alpha = image.matte() || options.colorspace == Some(Colorspace::Transparent);
    let channels = if with_alpha { 4 } else { 3 };

    let (columns, rows) = (image.columns() as usize, image.rows());
    let pixels: Vec<ColorKey> = image
        .pixels()?
        .iter()
        .map(|p| color_key(p, with_alpha))
        .collect();
    let pool = session.worker_pool(rows as usize)?;
    let histogram = pool.install(|| {
        pixels
            .par_chunks(columns)
            .fold(HashMap::new, |mut h, row| {
                for key in row {
                    *h.entry(*key).or_insert(0u64) += 1;
                }
                h
            })
            .reduce(HashMap::new, |mut a, b| {
                for (key, count) in b {
                    *a.entry(key).or_insert(0) += count;
                }
                a
            })
    });

    let assigned: Vec<ColorKey> = if histogram.len() <= n {
        tracing::debug!(colors = histogram.len(), "quantize: exact palette");
        pixels
    } else {
        tracing::debug!(colors = histogram.len(), target = n, "quantize: median cut");
        let boxes = median_cut(histogram.into_iter().collect(), n, channels);
        let means: Vec<ColorKey> = boxes.iter().map(ColorBox::mean).collect();
        if options.dither {
            let qr = image.quantum_range();
            floyd_steinberg(&pixels, columns, &means, channels, qr)
                .into_iter()
                .map(|i| means[i])
                .collect()
        } else {
            let membership: HashMap<ColorKey, usize> = boxes
                .iter()
                .enumerate()
                .flat_map(|(i, b)| b.entries.iter().map(move |(key, _)| (*key, i)))
                .collect();
            pixels
                .iter()
                .map(|key| membership.get(key).map_or(means[0], |&i| means[i]))
                .collect()
        }
    };

    // sorted, used-only palette
    let mut keys = assigned.clone();
    keys.par_sort_unstable();
    keys.dedup();
    let indexes = assigned
        .iter()
        .map(|key| {
            keys.binary_search(key)
                .map_err(|_| ColorError::QuantizationError("color missing from palette".into()))
        })
        .collect::<ColorResult<Vec<usize>>>()?;
    let palette = Palette::from_colors(keys.iter().map(key_pixel))?;

    let entries = palette.entries();
    let view = image.write_view();
    pool.install(|| {
        (0..rows).into_par_iter().try_for_each(|y| {
            let mut row = view.fetch_row(y)?;
            let base = y as usize * columns;
            for (x, pixel) in row.pixels_mut().iter_mut().enumerate() {
                *pixel = entries[indexes[base + x]];
            }
            view.sync(&row)?;
            Ok::<_, Error>(())
        })
    })?;
    tracing::debug!(entries = palette.len(), "quantized");
    image.set_palette(Some(palette));
    image.set_storage_class(StorageClass::Indexed);
    Ok(())
}

// =============================================================================
// Median cut
// =============================================================================

/// A box in color space holding distinct colors and their pixel counts
#[derive(Debug, Clone)]
struct ColorBox {
    entries: Vec<(ColorKey, u64)>,
    min: ColorKey,
    max: ColorKey,
    count: u64,
    channels: usize,
}

impl ColorBox {
    fn from_entries(entries: Vec<(ColorKey, u64)>, channels: usize) -> Self {
        let mut min = [Quantum::MAX; 4];
        let mut max = [0; 4];
        let mut count = 0;
        for (key, n) in &entries {
            for c in 0..channels {
                min[c] = min[c].min(key[c]);
                max[c] = max[c].max(key[c]);
            }
            count += n;
        }
        Self {
            entries,
            min,
            max,
            count,
            channels,
        }
    }

    fn volume(&self) -> f64 {
        (0..self.channels)
            .map(|c| (self.max[c] - self.min[c]) as f64 + 1.0)
            .product()
    }

    fn priority(&self) -> f64 {
        self.count as f64 * self.volume()
    }

    fn split(mut self) -> Result<(ColorBox, ColorBox), ColorBox> {
        if self.entries.len() < 2 {
            return Err(self);
        }

        // Find the channel with the largest range
        let channel = (0..self.channels)
            .max_by_key(|&c| (self.max[c] - self.min[c], std::cmp::Reverse(c)))
            .unwrap_or(0);
        self.entries.sort_unstable_by_key(|(key, _)| (key[channel], *key));

        // Split at the weighted median, keeping both halves non-empty
        let half = self.count.div_ceil(2);
        let mut seen = 0;
        let mut mid = self.entries.len() - 1;
        for (i, (_, n)) in self.entries.iter().enumerate() {
            seen += n;
            if seen >= half {
                mid = i + 1;
                break;
            }
        }
        let mid = mid.clamp(1, self.entries.len() - 1);
        let upper = self.entries.split_off(mid);
        Ok((
            ColorBox::from_entries(self.entries, self.channels),
            ColorBox::from_entries(upper, self.channels),
        ))
    }

    /// Pixel-weighted mean color, rounded.
    fn mean(&self) -> ColorKey {
        let total = u128::from(self.count.max(1));
        let mut sums = [0u128; 4];
        for (key, n) in &self.entries {
            for c in 0..4 {
                sums[c] += u128::from(key[c]) * u128::from(*n);
            }
        }
        sums.map(|s| ((s + total / 2) / total) as Quantum)
    }
}

impl Eq for ColorBox {}

impl PartialEq for ColorBox {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for ColorBox {
    fn cmp(&self, other: &Self) -> Ordering {
        // Priority: larger, busier boxes are split first
        self.priority().total_cmp(&other.priority())
    }
}

impl PartialOrd for ColorBox {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Split the histogram into at most `max_colors` boxes.
fn median_cut(
    histogram: Vec<(ColorKey, u64)>,
    max_colors: usize,
    channels: usize,
) -> Vec<ColorBox> {
    let mut boxes = BinaryHeap::new();
    boxes.push(ColorBox::from_entries(histogram, channels));
    let mut done = Vec::new();

    while boxes.len() + done.len() < max_colors {
        let Some(box_) = boxes.pop() else {
            break;
        };
        match box_.split() {
            Ok((lower, upper)) => {
                boxes.push(lower);
                boxes.push(upper);
            }
            Err(single) => done.push(single),
        }
    }
    done.extend(boxes);
    done
}

// =============================================================================
// Floyd-Steinberg
// =============================================================================

fn nearest(palette: &[ColorKey], value: &[f64; 4], channels: usize) -> usize {
    let distance = |key: &ColorKey| -> f64 {
        (0..channels)
            .map(|c| {
                let d = value[c] - key[c] as f64;
                d * d
            })
            .sum()
    };
    palette
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| distance(*a).total_cmp(&distance(*b)))
        .map_or(0, |(i, _)| i)
}

/// Map every pixel to a palette index, diffusing the error to the right
/// (7/16) and to the row below (3/16, 5/16, 1/16).
fn floyd_steinberg(
    pixels: &[ColorKey],
    columns: usize,
    palette: &[ColorKey],
    channels: usize,
    qr: Quantum,
) -> Vec<usize> {
    let top = qr as f64;
    let mut current = vec![[0.0f64; 4]; columns + 2];
    let mut next = vec![[0.0f64; 4]; columns + 2];
    let mut indexes = Vec::with_capacity(pixels.len());

    for row in pixels.chunks(columns) {
        for (x, key) in row.iter().enumerate() {
            // error buffers are offset by one so x - 1 never underflows
            let mut value = [0.0; 4];
            for c in 0..channels {
                value[c] = (key[c] as f64 + current[x + 1][c]).clamp(0.0, top);
            }
            let index = nearest(palette, &value, channels);
            indexes.push(index);
            for c in 0..channels {
                let error = value[c] - palette[index][c] as f64;
                current[x + 2][c] += error * 7.0 / 16.0;
                next[x][c] += error * 3.0 / 16.0;
                next[x + 1][c] += error * 5.0 / 16.0;
                next[x + 2][c] += error * 1.0 / 16.0;
            }
        }
        std::mem::swap(&mut current, &mut next);
        next.iter_mut().for_each(|e| *e = [0.0; 4]);
    }
    indexes
}
