//! Rectangles and gravity
//!
//! [`Rect`] is the canvas-coordinate rectangle used for bounding boxes and
//! crop requests. A rectangle with zero width or height is *degenerate*;
//! analysis results use that to signal "no content found".

use std::fmt;

/// A rectangle region in canvas coordinates
///
/// Like the other small geometry types this is `Copy`; it is passed and
/// returned by value everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left x coordinate
    pub x: i64,
    /// Top y coordinate
    pub y: i64,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full canvas of a `columns` x `rows` image.
    pub const fn canvas(columns: u32, rows: u32) -> Self {
        Self::new(0, 0, columns, rows)
    }

    /// Get the right x coordinate (exclusive)
    #[inline]
    pub fn right(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    /// Get the bottom y coordinate (exclusive)
    #[inline]
    pub fn bottom(&self) -> i64 {
        self.y + i64::from(self.height)
    }

    /// Get the area
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Check if the rectangle has zero width or zero height
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersect with a `columns` x `rows` canvas.
    ///
    /// Returns `None` when nothing of the rectangle lies on the canvas.
    pub fn clip_to_canvas(&self, columns: u32, rows: u32) -> Option<Rect> {
        let x = self.x.max(0);
        let y = self.y.max(0);
        let right = self.right().min(i64::from(columns));
        let bottom = self.bottom().min(i64::from(rows));
        if x < right && y < bottom {
            Some(Rect::new(x, y, (right - x) as u32, (bottom - y) as u32))
        } else {
            None
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{:+}{:+}", self.width, self.height, self.x, self.y)
    }
}

/// Canvas-relative anchor used to place a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gravity {
    #[default]
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Gravity {
    /// Canvas corner a gravity refers to: `(right, bottom)` flags.
    ///
    /// Edges map to the corner that starts them when walked clockwise from
    /// the top-left: north and north-west share the top-left corner, east
    /// the top-right, south the bottom-right, west the bottom-left.
    pub fn corner(self) -> (bool, bool) {
        match self {
            Gravity::NorthWest | Gravity::North | Gravity::Center => (false, false),
            Gravity::NorthEast | Gravity::East => (true, false),
            Gravity::SouthEast | Gravity::South => (true, true),
            Gravity::SouthWest | Gravity::West => (false, true),
        }
    }
}

/// Resolve a gravity-relative region to absolute canvas coordinates.
///
/// A zero width or height means "the full canvas extent". Offsets for the
/// east/south gravities are measured inward from the right/bottom edge;
/// for the centered gravities the region is centered on that axis and the
/// offset is added.
///
/// # Examples
///
/// ```
/// use pixattr_core::{Gravity, Rect, gravity_adjust};
///
/// // One-pixel column, 2 pixels in from the right edge of a 10x8 canvas
/// let r = gravity_adjust(10, 8, Gravity::NorthEast, Rect::new(2, 0, 1, 8));
/// assert_eq!(r, Rect::new(7, 0, 1, 8));
/// ```
pub fn gravity_adjust(columns: u32, rows: u32, gravity: Gravity, region: Rect) -> Rect {
    let mut r = region;
    if r.height == 0 {
        r.height = rows;
    }
    if r.width == 0 {
        r.width = columns;
    }
    let (cols, rows_, w, h) = (
        i64::from(columns),
        i64::from(rows),
        i64::from(r.width),
        i64::from(r.height),
    );
    match gravity {
        Gravity::NorthEast | Gravity::East | Gravity::SouthEast => r.x = cols - w - r.x,
        Gravity::North | Gravity::South | Gravity::Center => r.x += cols / 2 - w / 2,
        _ => {}
    }
    match gravity {
        Gravity::SouthWest | Gravity::South | Gravity::SouthEast => r.y = rows_ - h - r.y,
        Gravity::East | Gravity::West | Gravity::Center => r.y += rows_ / 2 - h / 2,
        _ => {}
    }
    r
}
