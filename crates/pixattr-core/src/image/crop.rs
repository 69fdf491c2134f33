//! Rectangle cropping

use super::Image;
use crate::cache::MemoryStore;
use crate::error::{Error, Result};
use crate::geometry::Rect;

impl Image {
    /// Extract a rectangular sub-region as a new image.
    ///
    /// The rectangle is clipped to the canvas first. The result keeps the
    /// source's attributes (storage class, palette, matte, artifacts).
    ///
    /// # Errors
    ///
    /// Returns [`Error::GeometryOutsideCanvas`] if the rectangle is
    /// degenerate or lies entirely outside the canvas.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixattr_core::{Image, QuantumDepth, Rect};
    ///
    /// let image = Image::new(100, 80, QuantumDepth::Q8).unwrap();
    /// let cropped = image.crop(Rect::new(80, 60, 50, 50)).unwrap();
    /// assert_eq!((cropped.columns(), cropped.rows()), (20, 20));
    /// ```
    pub fn crop(&self, rect: Rect) -> Result<Image> {
        let outside = || Error::GeometryOutsideCanvas {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            columns: self.columns,
            rows: self.rows,
        };
        let clipped = rect
            .clip_to_canvas(self.columns, self.rows)
            .ok_or_else(outside)?;

        let mut pixels = Vec::with_capacity(clipped.area() as usize);
        self.store.read(
            clipped.x as u32,
            clipped.y as u32,
            clipped.width,
            clipped.height,
            &mut pixels,
        )?;
        let store = MemoryStore::from_pixels(clipped.width, clipped.height, pixels)?;
        Ok(self.with_same_attributes(Box::new(store)))
    }
}
