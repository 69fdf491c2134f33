//! Pixel cache accessors
//!
//! Pixels live behind a [`PixelStore`]. Analysis code never touches the
//! store directly; it goes through one of two views:
//!
//! - [`CacheView`]: read-only. Serves authentic rows and synthesizes
//!   *virtual* pixels for coordinates outside the canvas according to the
//!   image's [`VirtualPixelPolicy`].
//! - [`AuthenticView`]: read/write. Rows are fetched into a [`RowBuffer`],
//!   modified, then synced back; a row is not visible to other readers
//!   until [`AuthenticView::sync`] returns.
//!
//! Stores take `&self` for writes and lock per row, so row-parallel
//! workers can share one view without coordinating.

use crate::error::{Error, Result};
use crate::pixel::Pixel;
use crate::quantum::Quantum;
use std::fmt;
use std::sync::RwLock;

/// Backing storage for an image's pixels.
pub trait PixelStore: Send + Sync + fmt::Debug {
    /// Width of the stored canvas.
    fn columns(&self) -> u32;

    /// Height of the stored canvas.
    fn rows(&self) -> u32;

    /// Read an in-canvas region, row-major, replacing the contents of `out`.
    fn read(&self, x: u32, y: u32, width: u32, height: u32, out: &mut Vec<Pixel>) -> Result<()>;

    /// Write one row segment starting at `(x, y)`.
    fn write(&self, x: u32, y: u32, pixels: &[Pixel]) -> Result<()>;
}

/// In-memory pixel store, one lock per row.
#[derive(Debug)]
pub struct MemoryStore {
    columns: u32,
    rows: u32,
    data: Vec<RwLock<Vec<Pixel>>>,
}

impl MemoryStore {
    /// Create a store filled with `fill`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if either dimension is zero.
    pub fn new(columns: u32, rows: u32, fill: Pixel) -> Result<Self> {
        if columns == 0 || rows == 0 {
            return Err(Error::InvalidDimension { columns, rows });
        }
        let data = (0..rows)
            .map(|_| RwLock::new(vec![fill; columns as usize]))
            .collect();
        Ok(Self {
            columns,
            rows,
            data,
        })
    }

    /// Create a store from row-major pixels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if a dimension is zero or the
    /// pixel count does not match.
    pub fn from_pixels(columns: u32, rows: u32, pixels: Vec<Pixel>) -> Result<Self> {
        if columns == 0 || rows == 0 || pixels.len() != columns as usize * rows as usize {
            return Err(Error::InvalidDimension { columns, rows });
        }
        let data = pixels
            .chunks_exact(columns as usize)
            .map(|row| RwLock::new(row.to_vec()))
            .collect();
        Ok(Self {
            columns,
            rows,
            data,
        })
    }

    fn check_region(&self, x: u32, y: u32, width: u32, height: u32) -> Result<()> {
        let fits = u64::from(x) + u64::from(width) <= u64::from(self.columns)
            && u64::from(y) + u64::from(height) <= u64::from(self.rows);
        if fits {
            Ok(())
        } else {
            Err(Error::GeometryOutsideCanvas {
                x: i64::from(x),
                y: i64::from(y),
                width,
                height,
                columns: self.columns,
                rows: self.rows,
            })
        }
    }
}

impl PixelStore for MemoryStore {
    fn columns(&self) -> u32 {
        self.columns
    }

    fn rows(&self) -> u32 {
        self.rows
    }

    fn read(&self, x: u32, y: u32, width: u32, height: u32, out: &mut Vec<Pixel>) -> Result<()> {
        self.check_region(x, y, width, height)?;
        out.clear();
        let (x0, x1) = (x as usize, (x + width) as usize);
        for row in y..y + height {
            let guard = self.data[row as usize]
                .read()
                .map_err(|_| Error::CacheRead {
                    y: i64::from(row),
                    reason: "row lock poisoned".into(),
                })?;
            out.extend_from_slice(&guard[x0..x1]);
        }
        Ok(())
    }

    fn write(&self, x: u32, y: u32, pixels: &[Pixel]) -> Result<()> {
        let width = u32::try_from(pixels.len()).map_err(|_| Error::CacheWrite {
            y: i64::from(y),
            reason: "row segment too long".into(),
        })?;
        self.check_region(x, y, width, 1)?;
        let mut guard = self.data[y as usize]
            .write()
            .map_err(|_| Error::CacheWrite {
                y: i64::from(y),
                reason: "row lock poisoned".into(),
            })?;
        guard[x as usize..x as usize + pixels.len()].copy_from_slice(pixels);
        Ok(())
    }
}

/// How pixels outside the canvas are synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VirtualPixelPolicy {
    /// Repeat the nearest edge pixel.
    #[default]
    Edge,
    /// Repeat the image periodically.
    Tile,
    /// Reflect the image at each edge.
    Mirror,
    /// The image background color.
    Background,
    /// Fully transparent black.
    Transparent,
    Black,
    White,
    /// Mid-range gray.
    Gray,
}

impl VirtualPixelPolicy {
    /// Map an out-of-range coordinate onto `[0, extent)`, or `None` for the
    /// constant-color policies.
    fn map(self, v: i64, extent: u32) -> Option<u32> {
        let n = i64::from(extent);
        if (0..n).contains(&v) {
            return Some(v as u32);
        }
        match self {
            VirtualPixelPolicy::Edge => Some(v.clamp(0, n - 1) as u32),
            VirtualPixelPolicy::Tile => Some(v.rem_euclid(n) as u32),
            VirtualPixelPolicy::Mirror => {
                let m = v.rem_euclid(2 * n);
                Some(if m < n { m } else { 2 * n - 1 - m } as u32)
            }
            _ => None,
        }
    }

    fn constant(self, background: Pixel, quantum_range: Quantum) -> Pixel {
        match self {
            VirtualPixelPolicy::Transparent => Pixel::rgbo(0, 0, 0, quantum_range),
            VirtualPixelPolicy::Black => Pixel::gray(0),
            VirtualPixelPolicy::White => Pixel::gray(quantum_range),
            VirtualPixelPolicy::Gray => Pixel::gray(quantum_range / 2 + 1),
            _ => background,
        }
    }
}

/// Read-only window over an image's pixels.
#[derive(Debug, Clone, Copy)]
pub struct CacheView<'a> {
    store: &'a dyn PixelStore,
    policy: VirtualPixelPolicy,
    background: Pixel,
    quantum_range: Quantum,
}

impl<'a> CacheView<'a> {
    pub fn new(
        store: &'a dyn PixelStore,
        policy: VirtualPixelPolicy,
        background: Pixel,
        quantum_range: Quantum,
    ) -> Self {
        Self {
            store,
            policy,
            background,
            quantum_range,
        }
    }

    #[inline]
    pub fn columns(&self) -> u32 {
        self.store.columns()
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.store.rows()
    }

    /// Read one full authentic row.
    pub fn read_row(&self, y: u32, out: &mut Vec<Pixel>) -> Result<()> {
        self.store.read(0, y, self.columns(), 1, out)
    }

    /// Read a region, synthesizing pixels that fall outside the canvas.
    pub fn virtual_pixels(
        &self,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        out: &mut Vec<Pixel>,
    ) -> Result<()> {
        let (columns, rows) = (self.columns(), self.rows());
        let inside = x >= 0
            && y >= 0
            && x + i64::from(width) <= i64::from(columns)
            && y + i64::from(height) <= i64::from(rows);
        if inside {
            return self.store.read(x as u32, y as u32, width, height, out);
        }

        out.clear();
        let constant = self.policy.constant(self.background, self.quantum_range);
        let mut source = Vec::with_capacity(columns as usize);
        for yy in y..y + i64::from(height) {
            let Some(sy) = self.policy.map(yy, rows) else {
                out.extend(std::iter::repeat_n(constant, width as usize));
                continue;
            };
            self.read_row(sy, &mut source)?;
            for xx in x..x + i64::from(width) {
                let pixel = match self.policy.map(xx, columns) {
                    Some(sx) => source[sx as usize],
                    None => constant,
                };
                out.push(pixel);
            }
        }
        Ok(())
    }

    /// Read a single pixel, virtual or authentic.
    pub fn pixel(&self, x: i64, y: i64) -> Result<Pixel> {
        let mut out = Vec::with_capacity(1);
        self.virtual_pixels(x, y, 1, 1, &mut out)?;
        out.first().copied().ok_or(Error::CacheRead {
            y,
            reason: "empty read".into(),
        })
    }
}

/// A fetched row awaiting sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBuffer {
    y: u32,
    pixels: Vec<Pixel>,
}

impl RowBuffer {
    #[inline]
    pub fn y(&self) -> u32 {
        self.y
    }

    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }
}

/// Read/write window over an image's pixels.
///
/// Obtained from a mutable image borrow, so there is at most one writer.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticView<'a> {
    store: &'a dyn PixelStore,
}

impl<'a> AuthenticView<'a> {
    pub fn new(store: &'a dyn PixelStore) -> Self {
        Self { store }
    }

    #[inline]
    pub fn columns(&self) -> u32 {
        self.store.columns()
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.store.rows()
    }

    /// Fetch row `y` for modification.
    pub fn fetch_row(&self, y: u32) -> Result<RowBuffer> {
        let mut pixels = Vec::with_capacity(self.columns() as usize);
        self.store.read(0, y, self.columns(), 1, &mut pixels)?;
        Ok(RowBuffer { y, pixels })
    }

    /// Write a fetched row back.
    pub fn sync(&self, row: &RowBuffer) -> Result<()> {
        self.store.write(0, row.y, &row.pixels)
    }
}
