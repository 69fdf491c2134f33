//! Content bounding box
//!
//! Two algorithms, selected by the `trim:percent-background` artifact:
//!
//! - **flood** (default): a single parallel pass comparing each pixel with
//!   the four canvas-corner colors
//! - **erosion**: shrink the canvas one edge at a time while some edge is
//!   still mostly background, see [`crate::census`]
//!
//! A degenerate result is reported as a `GeometryDoesNotContainImage`
//! warning through the session's diagnostic sink.

use crate::census::{CensusState, edge_census};
use crate::error::AnalysisResult;
use pixattr_core::{
    Comparator, Diagnostic, DiagnosticKind, Error, Gravity, Image, Pixel, Rect, Session,
    Severity, artifact,
};
use rayon::prelude::*;
use std::sync::Mutex;

const EPSILON: f64 = 1.0e-12;

/// Running extremes of the content found by the flood pass.
///
/// `min_*` start past the far edge and `max_*` start before the near one,
/// so merging is a plain elementwise min/max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extents {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl Extents {
    fn empty(columns: u32, rows: u32) -> Self {
        Self {
            min_x: i64::from(columns),
            min_y: i64::from(rows),
            max_x: -1,
            max_y: -1,
        }
    }

    fn merge(&mut self, other: &Extents) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Inclusive rectangle, or `None` when nothing was found.
    fn to_rect(self) -> Option<Rect> {
        if self.max_x < self.min_x || self.max_y < self.min_y {
            return None;
        }
        Some(Rect::new(
            self.min_x,
            self.min_y,
            (self.max_x - self.min_x + 1) as u32,
            (self.max_y - self.min_y + 1) as u32,
        ))
    }
}

/// Colors of the four canvas corners.
#[derive(Debug, Clone, Copy)]
struct CornerTargets {
    top_left: Pixel,
    top_right: Pixel,
    bottom_left: Pixel,
    bottom_right: Pixel,
}

/// Extents contributed by one row.
///
/// The four corner pixels define the background and never count as content.
fn scan_row(
    row: &[Pixel],
    y: i64,
    targets: &CornerTargets,
    comparator: &Comparator,
    columns: u32,
    rows: u32,
) -> Extents {
    let mut e = Extents::empty(columns, rows);
    let last_x = i64::from(columns) - 1;
    let edge_row = y == 0 || y == i64::from(rows) - 1;
    for (x, pixel) in row.iter().enumerate() {
        let x = x as i64;
        if edge_row && (x == 0 || x == last_x) {
            continue;
        }
        let differs = |target: &Pixel| !comparator.similar(pixel, target);
        if x < e.min_x && differs(&targets.top_left) {
            e.min_x = x;
        }
        if x > e.max_x && differs(&targets.top_right) {
            e.max_x = x;
        }
        if y < e.min_y && differs(&targets.top_left) {
            e.min_y = y;
        }
        if y > e.max_y && differs(&targets.bottom_left) {
            e.max_y = y;
        }
        if x > e.max_x && y > e.max_y && differs(&targets.bottom_right) {
            e.max_x = e.max_x.max(x);
            e.max_y = e.max_y.max(y);
        }
    }
    e
}

fn warn_degenerate(image: &Image, session: &Session) {
    session.sink().report(Diagnostic {
        severity: Severity::Warning,
        kind: DiagnosticKind::GeometryDoesNotContainImage,
        context: image.filename().to_string(),
    });
}

/// Bounding box of the image content.
///
/// Uses edge erosion when the `trim:percent-background` artifact is set,
/// otherwise the four-corner flood bound. When the flood bound finds no
/// content the full canvas is returned with a warning.
///
/// # Errors
///
/// Returns an error if a row cannot be read or the worker pool cannot be
/// started.
///
/// # Examples
///
/// ```
/// use pixattr_analysis::get_image_bounding_box;
/// use pixattr_core::{Image, Pixel, QuantumDepth, Rect, Session};
///
/// let image = Image::from_fn(8, 6, QuantumDepth::Q8, |x, y| {
///     let inside = (2..5).contains(&x) && (1..3).contains(&y);
///     Pixel::gray(if inside { 0 } else { 255 })
/// })
/// .unwrap();
/// let bounds = get_image_bounding_box(&image, &Session::default()).unwrap();
/// assert_eq!(bounds, Rect::new(2, 1, 3, 2));
/// ```
pub fn get_image_bounding_box(image: &Image, session: &Session) -> AnalysisResult<Rect> {
    tracing::trace!(filename = image.filename(), "get_image_bounding_box");
    if image.artifact(artifact::TRIM_PERCENT_BACKGROUND).is_some() {
        return Ok(edge_bounding_box(image, session));
    }
    flood_bounding_box(image, session)
}

/// Four-corner flood bound.
pub fn flood_bounding_box(image: &Image, session: &Session) -> AnalysisResult<Rect> {
    let (columns, rows) = (image.columns(), image.rows());
    let view = image.read_view();
    let (right, bottom) = (i64::from(columns) - 1, i64::from(rows) - 1);
    let targets = CornerTargets {
        top_left: view.pixel(0, 0)?,
        top_right: view.pixel(right, 0)?,
        bottom_left: view.pixel(0, bottom)?,
        bottom_right: view.pixel(right, bottom)?,
    };
    let comparator = image.comparator();

    let bounds = Mutex::new(Extents::empty(columns, rows));
    let pool = session.worker_pool(rows as usize)?;
    pool.install(|| {
        (0..rows).into_par_iter().try_for_each_init(Vec::new, |row, y| {
            view.read_row(y, row)?;
            let local = scan_row(row, i64::from(y), &targets, &comparator, columns, rows);
            let mut shared = bounds.lock().map_err(|_| Error::CacheRead {
                y: i64::from(y),
                reason: "bounding box lock poisoned".into(),
            })?;
            shared.merge(&local);
            Ok::<_, Error>(())
        })
    })?;
    let extents = bounds.into_inner().map_err(|_| Error::CacheRead {
        y: 0,
        reason: "bounding box lock poisoned".into(),
    })?;

    match extents.to_rect() {
        Some(rect) => Ok(rect),
        None => {
            warn_degenerate(image, session);
            Ok(Rect::canvas(columns, rows))
        }
    }
}

/// Iterative percent-background edge erosion.
///
/// Edges are eroded one pixel at a time, always the edge with the lowest
/// census (left, right, top, bottom on ties), until every edge's census
/// reaches the threshold `clamp(1 - percent / 100, ε, 1)` or the rectangle
/// becomes degenerate. A degenerate result is returned as is, with a
/// warning.
pub fn edge_bounding_box(image: &Image, session: &Session) -> Rect {
    let (columns, rows) = (image.columns(), image.rows());
    let mut width = columns;
    let mut height = rows;
    // erosion offsets from each canvas edge
    let (mut left, mut right, mut top, mut bottom) = (0i64, 0i64, 0i64, 0i64);

    let mut edge = CensusState {
        left: edge_census(image, Gravity::West, 1, 0, 0, 0),
        right: edge_census(image, Gravity::East, 1, 0, 0, 0),
        top: edge_census(image, Gravity::North, 0, 1, 0, 0),
        bottom: edge_census(image, Gravity::South, 0, 1, 0, 0),
    };
    let percent = image
        .artifact(artifact::TRIM_PERCENT_BACKGROUND)
        .map_or(1.0, |value| artifact::leading_f64(value) / 100.0);
    let threshold = (1.0 - percent).clamp(EPSILON, 1.0);
    tracing::debug!(threshold, "edge erosion");

    let mut census = edge.min();
    while census < threshold {
        if width == 0 || height == 0 {
            break;
        }
        if (edge.left - census).abs() < EPSILON {
            left += 1;
            width -= 1;
            edge.left = edge_census(image, Gravity::NorthWest, 1, height, left, top);
            edge.top = edge_census(image, Gravity::NorthWest, width, 1, left, top);
            edge.bottom = edge_census(image, Gravity::SouthWest, width, 1, left, bottom);
        } else if (edge.right - census).abs() < EPSILON {
            right += 1;
            width -= 1;
            edge.right = edge_census(image, Gravity::NorthEast, 1, height, right, top);
            edge.top = edge_census(image, Gravity::NorthWest, width, 1, left, top);
            edge.bottom = edge_census(image, Gravity::SouthWest, width, 1, left, bottom);
        } else if (edge.top - census).abs() < EPSILON {
            top += 1;
            height -= 1;
            edge.left = edge_census(image, Gravity::NorthWest, 1, height, left, top);
            edge.right = edge_census(image, Gravity::NorthEast, 1, height, right, top);
            edge.top = edge_census(image, Gravity::NorthWest, width, 1, left, top);
        } else if (edge.bottom - census).abs() < EPSILON {
            bottom += 1;
            height -= 1;
            edge.left = edge_census(image, Gravity::NorthWest, 1, height, left, top);
            edge.right = edge_census(image, Gravity::NorthEast, 1, height, right, top);
            edge.bottom = edge_census(image, Gravity::SouthWest, width, 1, left, bottom);
        } else {
            break;
        }
        census = edge.min();
    }

    let bounds = Rect::new(left, top, width, height);
    if bounds.is_degenerate() {
        warn_degenerate(image, session);
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixattr_core::{CollectingSink, Colorspace, QuantumDepth, ResourceLimits, Tolerance};
    use std::sync::Arc;

    fn targets(bg: Pixel) -> CornerTargets {
        CornerTargets {
            top_left: bg,
            top_right: bg,
            bottom_left: bg,
            bottom_right: bg,
        }
    }

    #[test]
    fn test_rows_merge_in_any_order() {
        let bg = Pixel::gray(255);
        let fg = Pixel::gray(0);
        let cmp = Comparator::new(Tolerance::Exact, false, Colorspace::Srgb, 255);
        let rows: Vec<Vec<Pixel>> = (0..5)
            .map(|y| {
                (0..6)
                    .map(|x| if (x == 1 && y == 3) || (x == 4 && y == 1) { fg } else { bg })
                    .collect()
            })
            .collect();
        let t = targets(bg);

        let mut forward = Extents::empty(6, 5);
        for (y, row) in rows.iter().enumerate() {
            forward.merge(&scan_row(row, y as i64, &t, &cmp, 6, 5));
        }
        let mut backward = Extents::empty(6, 5);
        for (y, row) in rows.iter().enumerate().rev() {
            backward.merge(&scan_row(row, y as i64, &t, &cmp, 6, 5));
        }
        assert_eq!(forward, backward);
        assert_eq!(forward.to_rect(), Some(Rect::new(1, 1, 4, 3)));
    }

    #[test]
    fn test_bottom_right_needs_both_axes() {
        let white = Pixel::gray(255);
        let cmp = Comparator::new(Tolerance::Exact, false, Colorspace::Srgb, 255);
        let t = CornerTargets {
            bottom_right: Pixel::gray(0),
            ..targets(white)
        };
        // once the first pixel raises max_y to this row, later pixels exceed
        // max_x alone and must not move either maximum
        let row = vec![white; 6];
        let e = scan_row(&row, 2, &t, &cmp, 6, 5);
        assert_eq!(
            e,
            Extents {
                min_x: 6,
                min_y: 5,
                max_x: 0,
                max_y: 2,
            }
        );
    }

    #[test]
    fn test_content_on_first_row_and_column() {
        let bg = Pixel::gray(255);
        let cmp = Comparator::new(Tolerance::Exact, false, Colorspace::Srgb, 255);
        let t = targets(bg);
        let rows: Vec<Vec<Pixel>> = (0..3)
            .map(|y| (0..3).map(|x| if x == 0 && y == 1 { Pixel::gray(0) } else { bg }).collect())
            .collect();
        let mut e = Extents::empty(3, 3);
        for (y, row) in rows.iter().enumerate() {
            e.merge(&scan_row(row, y as i64, &t, &cmp, 3, 3));
        }
        assert_eq!(e.to_rect(), Some(Rect::new(0, 1, 1, 1)));
    }

    #[test]
    fn test_uniform_image_warns_and_returns_canvas() {
        let sink = Arc::new(CollectingSink::new());
        let session = Session::new(ResourceLimits::new(2)).with_sink(sink.clone());
        let image = Image::new(5, 3, QuantumDepth::Q8).unwrap();
        let bounds = get_image_bounding_box(&image, &session).unwrap();
        assert_eq!(bounds, Rect::canvas(5, 3));
        assert_eq!(sink.count(DiagnosticKind::GeometryDoesNotContainImage), 1);
    }

    #[test]
    fn test_single_column() {
        let image = Image::from_fn(1, 4, QuantumDepth::Q8, |_, y| {
            Pixel::gray(if y == 2 { 0 } else { 255 })
        })
        .unwrap();
        let bounds = flood_bounding_box(&image, &Session::new(ResourceLimits::new(1))).unwrap();
        assert_eq!(bounds, Rect::new(0, 2, 1, 1));
    }
}
