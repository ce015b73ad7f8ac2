//! Mark detection: decide which interior cells carry a human mark.
//!
//! A linear rescale pulls the whole image slightly darker, then a
//! center-heavy 3x3 sharpen pushes clean paper back to saturation
//! while graphite and ink stay dark. A cell whose mean intensity after
//! this pass falls below the configured ceiling is marked; its center
//! point is what the grading layer consumes.

use image::{GrayImage, Luma, imageops};
use imageproc::filter::filter3x3;
use tracing::debug;

use crate::types::{BoundingBox, MarkPoint, RgbaImage, Shape, SheetConfig};

/// Sharpen kernel: strong center, uniform negative surround. The sum
/// of 3 keeps clean paper saturated after the rescale darkens it.
const SHARPEN_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 11.0, -1.0, -1.0, -1.0, -1.0];

/// Find the center of every cell judged to carry a mark.
#[must_use]
pub fn detect_marks(rectified: &RgbaImage, cells: &[Shape], config: &SheetConfig) -> Vec<MarkPoint> {
    let gray = imageops::grayscale(rectified);
    let sharpened = enhance(&gray, config);
    let marks = marked_points(&sharpened, cells, config.mark_intensity_ceiling);
    debug!(candidates = cells.len(), marked = marks.len(), "detected marks");
    marks
}

/// Linear rescale followed by the 3x3 sharpen.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn enhance(gray: &GrayImage, config: &SheetConfig) -> GrayImage {
    let rescaled = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = f32::from(gray.get_pixel(x, y).0[0]);
        let scaled = (config.mark_gain * v + config.mark_bias)
            .round()
            .clamp(0.0, 255.0);
        Luma([scaled as u8])
    });
    filter3x3::<Luma<u8>, f32, u8>(&rescaled, &SHARPEN_KERNEL)
}

/// Centers of the cells whose mean intensity is strictly below `ceiling`.
fn marked_points(sharpened: &GrayImage, cells: &[Shape], ceiling: f64) -> Vec<MarkPoint> {
    cells
        .iter()
        .filter(|cell| {
            region_mean(sharpened, &cell.bounding_box).is_some_and(|mean| mean < ceiling)
        })
        .map(|cell| cell.bounding_box.center())
        .collect()
}

/// Mean intensity over a bounding box, clamped to the image extent.
///
/// Returns `None` when the box lies entirely outside the image.
fn region_mean(image: &GrayImage, bounds: &BoundingBox) -> Option<f64> {
    let x_end = bounds.right().min(image.width());
    let y_end = bounds.bottom().min(image.height());
    if bounds.x >= x_end || bounds.y >= y_end {
        return None;
    }

    let mut sum = 0u64;
    for y in bounds.y..y_end {
        for x in bounds.x..x_end {
            sum += u64::from(image.get_pixel(x, y).0[0]);
        }
    }
    let count = u64::from(x_end - bounds.x) * u64::from(y_end - bounds.y);
    #[allow(clippy::cast_precision_loss)]
    Some(sum as f64 / count as f64)
}
