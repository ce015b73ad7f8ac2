//! Shape measurement: binary rasters in, measured [`Shape`]s out.
//!
//! Wraps `imageproc`'s Suzuki-Abe border following and reduces each
//! top-level contour to the measurements the rest of the pipeline
//! consumes: an axis-aligned bounding box, the enclosed area (shoelace
//! formula), and the closed perimeter.

use image::GrayImage;
use imageproc::contours::Contour;
use imageproc::geometry::arc_length;
use imageproc::point::Point;

use crate::types::{BoundingBox, Shape};

/// Trace the external (top-level) contours of a binary image.
///
/// White pixels are foreground. Contours nested inside another contour
/// are discarded; the grid stages only ever reason about outermost
/// blobs, the way cells and ruler marks print as isolated regions.
#[must_use]
pub fn external_contours(binary: &GrayImage) -> Vec<Contour<i32>> {
    imageproc::contours::find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.parent.is_none())
        .collect()
}

/// The contour enclosing the largest area, if any.
#[must_use]
pub fn largest(contours: &[Contour<i32>]) -> Option<&Contour<i32>> {
    contours
        .iter()
        .max_by(|a, b| shoelace_area(&a.points).total_cmp(&shoelace_area(&b.points)))
}

/// Axis-aligned bounding box of a point set.
///
/// Width and height span the full pixel extent (`max - min + 1`), so a
/// single-pixel contour gets a 1x1 box. Returns `None` for an empty set.
#[must_use]
pub fn bounding_box(points: &[Point<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    // Contour points come from raster coordinates, never negative.
    let min_x = u32::try_from(min_x).ok()?;
    let min_y = u32::try_from(min_y).ok()?;
    let max_x = u32::try_from(max_x).ok()?;
    let max_y = u32::try_from(max_y).ok()?;
    Some(BoundingBox::new(
        min_x,
        min_y,
        max_x - min_x + 1,
        max_y - min_y + 1,
    ))
}

/// Enclosed area of a closed contour via the shoelace formula.
#[must_use]
pub fn shoelace_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        doubled += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
    }
    #[allow(clippy::cast_precision_loss)]
    let area = (doubled.abs() as f64) / 2.0;
    area
}

/// Reduce a contour to its [`Shape`] measurements.
///
/// Returns `None` for degenerate contours with no extent.
#[must_use]
pub fn shape_of(contour: &Contour<i32>) -> Option<Shape> {
    let bounding_box = bounding_box(&contour.points)?;
    Some(Shape {
        bounding_box,
        area: shoelace_area(&contour.points),
        perimeter: arc_length(&contour.points, true),
    })
}

/// Measure every external contour of a binary image.
#[must_use]
pub fn external_shapes(binary: &GrayImage) -> Vec<Shape> {
    external_contours(binary)
        .iter()
        .filter_map(shape_of)
        .collect()
}
