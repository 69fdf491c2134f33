//! Synthetic test images
//!
//! Every builder produces an in-memory image; no file formats are
//! involved.

use crate::error::{TestError, TestResult};
use pixattr_core::{
    Error, Image, MemoryStore, Palette, Pixel, PixelStore, QuantumDepth, Rect, Result,
};

fn synth(name: &'static str, result: Result<Image>) -> TestResult<Image> {
    result.map_err(|source| TestError::Synth { name, source })
}

/// Image filled with one color.
pub fn solid(columns: u32, rows: u32, depth: QuantumDepth, color: Pixel) -> TestResult<Image> {
    synth("solid", Image::from_fn(columns, rows, depth, |_, _| color))
}

/// `background` everywhere except `foreground` inside `rect`.
pub fn two_tone(
    columns: u32,
    rows: u32,
    depth: QuantumDepth,
    background: Pixel,
    foreground: Pixel,
    rect: Rect,
) -> TestResult<Image> {
    synth(
        "two_tone",
        Image::from_fn(columns, rows, depth, |x, y| {
            let (x, y) = (i64::from(x), i64::from(y));
            if x >= rect.x && x < rect.right() && y >= rect.y && y < rect.bottom() {
                foreground
            } else {
                background
            }
        }),
    )
}

/// Horizontal gray ramp from black to white.
pub fn gray_ramp(columns: u32, rows: u32, depth: QuantumDepth) -> TestResult<Image> {
    let qr = depth.range();
    let span = u128::from(columns.saturating_sub(1).max(1));
    synth(
        "gray_ramp",
        Image::from_fn(columns, rows, depth, |x, _| {
            Pixel::gray((u128::from(qr) * u128::from(x) / span) as u64)
        }),
    )
}

/// Color ramp: red follows x, green follows y, blue is constant.
pub fn color_ramp(columns: u32, rows: u32, depth: QuantumDepth) -> TestResult<Image> {
    let qr = u128::from(depth.range());
    let xs = u128::from(columns.saturating_sub(1).max(1));
    let ys = u128::from(rows.saturating_sub(1).max(1));
    synth(
        "color_ramp",
        Image::from_fn(columns, rows, depth, |x, y| {
            Pixel::rgb(
                (qr * u128::from(x) / xs) as u64,
                (qr * u128::from(y) / ys) as u64,
                (qr / 3) as u64,
            )
        }),
    )
}

/// Indexed image over `colors`, pixel `(x, y)` using entry
/// `(x + y) % colors.len()`.
pub fn paletted(
    columns: u32,
    rows: u32,
    depth: QuantumDepth,
    colors: &[Pixel],
) -> TestResult<Image> {
    let n = colors.len().max(1);
    let result = Palette::from_colors(colors.iter().copied()).and_then(|palette| {
        Image::from_indexes(columns, rows, depth, palette, |x, y| (x + y) as usize % n)
    });
    synth("paletted", result)
}

/// Pixel store whose reads and writes of one row always fail.
#[derive(Debug)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_row: u32,
}

impl FailingStore {
    pub fn new(inner: MemoryStore, fail_row: u32) -> Self {
        Self { inner, fail_row }
    }

    fn touches(&self, y: u32, height: u32) -> bool {
        (y..y.saturating_add(height)).contains(&self.fail_row)
    }
}

impl PixelStore for FailingStore {
    fn columns(&self) -> u32 {
        self.inner.columns()
    }

    fn rows(&self) -> u32 {
        self.inner.rows()
    }

    fn read(&self, x: u32, y: u32, width: u32, height: u32, out: &mut Vec<Pixel>) -> Result<()> {
        if self.touches(y, height) {
            return Err(Error::CacheRead {
                y: i64::from(self.fail_row),
                reason: "injected read failure".into(),
            });
        }
        self.inner.read(x, y, width, height, out)
    }

    fn write(&self, x: u32, y: u32, pixels: &[Pixel]) -> Result<()> {
        if y == self.fail_row {
            return Err(Error::CacheWrite {
                y: i64::from(y),
                reason: "injected write failure".into(),
            });
        }
        self.inner.write(x, y, pixels)
    }
}

/// Image filled with `color` whose row `fail_row` cannot be read or written.
pub fn failing(
    columns: u32,
    rows: u32,
    depth: QuantumDepth,
    color: Pixel,
    fail_row: u32,
) -> TestResult<Image> {
    let result = MemoryStore::new(columns, rows, color)
        .map(|store| Image::with_store(Box::new(FailingStore::new(store, fail_row)), depth));
    synth("failing", result)
}
