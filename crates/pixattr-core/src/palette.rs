//! Palette - color table for indexed images
//!
//! Pixels of an [`Indexed`](crate::StorageClass::Indexed) image store an
//! index into the palette in their index sample. Every pixel's color is
//! one of the palette entries, so whole-image color questions on an opaque
//! indexed image can be answered from the palette alone.

use crate::error::{Error, Result};
use crate::pixel::Pixel;

/// Largest number of entries a palette may hold.
pub const MAX_PALETTE_SIZE: usize = 65536;

/// Ordered color table for indexed images
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    entries: Vec<Pixel>,
}

impl Palette {
    /// Create an empty palette.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a palette from a list of colors.
    ///
    /// The index sample of each entry is set to its position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if there are more than
    /// [`MAX_PALETTE_SIZE`] entries.
    pub fn from_colors(colors: impl IntoIterator<Item = Pixel>) -> Result<Self> {
        let mut palette = Self::new();
        for color in colors {
            palette.push(color)?;
        }
        Ok(palette)
    }

    /// Get the number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by index
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Pixel> {
        self.entries.get(index)
    }

    /// Get a mutable entry by index
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Pixel> {
        self.entries.get_mut(index)
    }

    /// Append a color, returning its index.
    pub fn push(&mut self, color: Pixel) -> Result<usize> {
        if self.entries.len() >= MAX_PALETTE_SIZE {
            return Err(Error::InvalidParameter(format!(
                "palette is full ({MAX_PALETTE_SIZE} entries)"
            )));
        }
        let index = self.entries.len();
        self.entries.push(Pixel {
            index: index as u64,
            ..color
        });
        Ok(index)
    }

    /// Find the first entry whose color (ignoring the index sample) equals
    /// `color`.
    pub fn index_of(&self, color: &Pixel) -> Option<usize> {
        self.entries.iter().position(|e| {
            e.red == color.red
                && e.green == color.green
                && e.blue == color.blue
                && e.opacity == color.opacity
        })
    }

    /// Look up the color for a pixel's index sample.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if the index is not in the table.
    pub fn resolve(&self, index: u64) -> Result<&Pixel> {
        let len = self.entries.len();
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .ok_or(Error::IndexOutOfBounds {
                index: index as usize,
                len,
            })
    }

    /// Check if every entry is gray
    pub fn is_gray(&self) -> bool {
        self.entries.iter().all(Pixel::is_gray)
    }

    /// Get all entries as a slice
    #[inline]
    pub fn entries(&self) -> &[Pixel] {
        &self.entries
    }

    /// Get all entries as a mutable slice
    #[inline]
    pub fn entries_mut(&mut self) -> &mut [Pixel] {
        &mut self.entries
    }
}
