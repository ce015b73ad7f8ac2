//! Perspective rectification: reduce the grid border to four corners
//! and warp the region into an upright rectangle.
//!
//! The grid prints as a dark border on bright paper, so an inverted
//! Otsu cut turns it into the dominant foreground blob. Its contour is
//! simplified to a polygon; exactly four vertices means we have a
//! usable quadrilateral.

use image::{Rgba, imageops};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use tracing::debug;

use crate::shape;
use crate::types::{RgbaImage, ScanError, SheetConfig};

/// Warp the grid region into an upright, axis-aligned rectangle.
///
/// The output edge lengths are taken from the longer of each pair of
/// opposite quadrilateral edges, so a tilted capture is stretched, not
/// shrunk. The warped image is rotated a quarter turn clockwise to
/// restore the printed orientation of the template.
///
/// # Errors
///
/// Returns [`ScanError::CornerDetectionFailed`] if the border contour
/// does not simplify to four corners or the corners are degenerate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rectify(region: &RgbaImage, config: &SheetConfig) -> Result<RgbaImage, ScanError> {
    let [tl, tr, br, bl] = order_corners(find_corners(region, config)?);

    let width = distance(tl, tr).max(distance(bl, br)).round();
    let height = distance(tl, bl).max(distance(tr, br)).round();
    if width < 1.0 || height < 1.0 {
        return Err(ScanError::CornerDetectionFailed);
    }

    let destination = [
        (0.0, 0.0),
        (width - 1.0, 0.0),
        (width - 1.0, height - 1.0),
        (0.0, height - 1.0),
    ];
    let projection = Projection::from_control_points([tl, tr, br, bl], destination)
        .ok_or(ScanError::CornerDetectionFailed)?;

    let mut upright = RgbaImage::new(width as u32, height as u32);
    warp_into(
        region,
        &projection,
        Interpolation::Bilinear,
        Rgba([255, 255, 255, 255]),
        &mut upright,
    );

    debug!(width = upright.width(), height = upright.height(), "rectified grid");
    Ok(imageops::rotate90(&upright))
}

/// Find the four corners of the grid border.
///
/// # Errors
///
/// Returns [`ScanError::CornerDetectionFailed`] if no border contour
/// exists or polygon simplification yields anything but four vertices.
#[allow(clippy::cast_precision_loss)]
pub fn find_corners(
    region: &RgbaImage,
    config: &SheetConfig,
) -> Result<[(f32, f32); 4], ScanError> {
    let gray = imageops::grayscale(region);
    let level = otsu_level(&gray);
    let binary = threshold(&gray, level, ThresholdType::BinaryInverted);

    let contours = shape::external_contours(&binary);
    let border = shape::largest(&contours).ok_or(ScanError::CornerDetectionFailed)?;

    let perimeter = arc_length(&border.points, true);
    let polygon = approximate_polygon_dp(&border.points, config.polygon_tolerance * perimeter, true);

    match polygon.as_slice() {
        [a, b, c, d] => Ok([
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            (c.x as f32, c.y as f32),
            (d.x as f32, d.y as f32),
        ]),
        other => {
            debug!(vertices = other.len(), "border did not reduce to a quadrilateral");
            Err(ScanError::CornerDetectionFailed)
        }
    }
}

/// Sort four corners into top-left, top-right, bottom-right,
/// bottom-left order.
///
/// The top-left corner minimizes `x + y` and the bottom-right maximizes
/// it; the top-right maximizes `x - y` and the bottom-left minimizes
/// it. This holds for any convex quadrilateral regardless of the order
/// the contour tracer emitted the vertices in.
#[must_use]
pub fn order_corners(corners: [(f32, f32); 4]) -> [(f32, f32); 4] {
    let by_sum = |p: &&(f32, f32)| p.0 + p.1;
    let by_diff = |p: &&(f32, f32)| p.0 - p.1;

    let tl = fold_extreme(&corners, by_sum, false);
    let br = fold_extreme(&corners, by_sum, true);
    let tr = fold_extreme(&corners, by_diff, true);
    let bl = fold_extreme(&corners, by_diff, false);
    [tl, tr, br, bl]
}

fn fold_extreme(
    corners: &[(f32, f32); 4],
    key: impl Fn(&&(f32, f32)) -> f32,
    take_max: bool,
) -> (f32, f32) {
    let mut best = &corners[0];
    for corner in &corners[1..] {
        let better = if take_max {
            key(&corner) > key(&best)
        } else {
            key(&corner) < key(&best)
        };
        if better {
            best = corner;
        }
    }
    *best
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}
