//! Edge background census
//!
//! Measures, for one strip along an edge of a sub-rectangle, the fraction
//! of pixels that differ from the background color.

use pixattr_core::{Gravity, Image, Pixel, Rect, artifact, gravity_adjust, parse_color};

/// Background fraction measured at each edge of a shrinking rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CensusState {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl CensusState {
    /// Smallest of the four edge fractions.
    #[inline]
    pub fn min(&self) -> f64 {
        self.left.min(self.right).min(self.top).min(self.bottom)
    }
}

/// Reference background for an edge.
///
/// The canvas corner matching `gravity`, overridden by the `background`
/// artifact and then by `trim:background-color`. Returns `None` when the
/// corner cannot be read.
pub fn edge_background(image: &Image, gravity: Gravity) -> Option<Pixel> {
    let (right, bottom) = gravity.corner();
    let x = if right { i64::from(image.columns()) - 1 } else { 0 };
    let y = if bottom { i64::from(image.rows()) - 1 } else { 0 };
    let mut background = image.read_view().pixel(x, y).ok()?;

    for key in [artifact::BACKGROUND, artifact::TRIM_BACKGROUND_COLOR] {
        if let Some(spec) = image.artifact(key) {
            match parse_color(spec, image.quantum_depth()) {
                Ok(color) => background = color,
                Err(e) => tracing::debug!(key, error = %e, "ignoring background artifact"),
            }
        }
    }
    Some(background)
}

/// Fraction of non-background pixels in the strip `width` x `height` at
/// offset `(x, y)` relative to `gravity`.
///
/// A zero width or height spans the full canvas in that dimension. The
/// strip is clipped to the canvas; an empty or unreadable strip counts as
/// 0.
pub fn edge_census(
    image: &Image,
    gravity: Gravity,
    width: u32,
    height: u32,
    x: i64,
    y: i64,
) -> f64 {
    let Some(background) = edge_background(image, gravity) else {
        return 0.0;
    };
    let geometry = gravity_adjust(
        image.columns(),
        image.rows(),
        gravity,
        Rect::new(x, y, width, height),
    );
    let strip = match image.crop(geometry) {
        Ok(strip) => strip,
        Err(e) => {
            tracing::trace!(%geometry, error = %e, "empty census strip");
            return 0.0;
        }
    };
    let pixels = match strip.pixels() {
        Ok(pixels) => pixels,
        Err(e) => {
            tracing::debug!(%geometry, error = %e, "unreadable census strip");
            return 0.0;
        }
    };
    if pixels.is_empty() {
        return 0.0;
    }

    let comparator = image.comparator();
    let differing = pixels
        .iter()
        .filter(|pixel| !comparator.similar(pixel, &background))
        .count();
    differing as f64 / pixels.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixattr_core::QuantumDepth;

    fn framed() -> Image {
        // white 6x4 canvas, black column at x = 4
        Image::from_fn(6, 4, QuantumDepth::Q8, |x, _| {
            Pixel::gray(if x == 4 { 0 } else { 255 })
        })
        .unwrap()
    }

    #[test]
    fn test_full_edges() {
        let image = framed();
        assert_eq!(edge_census(&image, Gravity::West, 1, 0, 0, 0), 0.0);
        assert_eq!(edge_census(&image, Gravity::North, 0, 1, 0, 0), 1.0 / 6.0);
        // one column in from the right edge
        assert_eq!(edge_census(&image, Gravity::NorthEast, 1, 4, 1, 0), 1.0);
    }

    #[test]
    fn test_outside_strip_is_zero() {
        let image = framed();
        assert_eq!(edge_census(&image, Gravity::NorthWest, 1, 4, 10, 0), 0.0);
    }

    #[test]
    fn test_background_artifacts() {
        let mut image = framed();
        image.artifacts_mut().set(artifact::BACKGROUND, "black");
        assert_eq!(edge_background(&image, Gravity::West), Some(Pixel::gray(0)));
        image
            .artifacts_mut()
            .set(artifact::TRIM_BACKGROUND_COLOR, "#808080");
        assert_eq!(edge_background(&image, Gravity::West), Some(Pixel::gray(128)));
        image
            .artifacts_mut()
            .set(artifact::TRIM_BACKGROUND_COLOR, "not-a-color");
        assert_eq!(edge_background(&image, Gravity::West), Some(Pixel::gray(0)));
    }

    #[test]
    fn test_census_min() {
        let state = CensusState {
            left: 0.5,
            right: 0.25,
            top: 1.0,
            bottom: 0.75,
        };
        assert_eq!(state.min(), 0.25);
    }
}
