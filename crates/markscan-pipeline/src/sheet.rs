//! Sheet location: find the bright paper region in a raw photo and
//! crop to it.
//!
//! The sheet is assumed to be the dominant bright region against a
//! darker background. A fixed brightness cut separates the two; the
//! largest connected bright blob wins.

use image::imageops;
use imageproc::contrast::{ThresholdType, threshold};
use tracing::debug;

use crate::shape;
use crate::types::{RgbaImage, ScanError, SheetConfig};

/// Locate the sheet in `photo` and return the cropped region.
///
/// # Errors
///
/// Returns [`ScanError::SheetNotFound`] if the frame has no
/// figure/ground split at the configured threshold (e.g. a blank white
/// or blank dark photo) or no bright blob survives tracing.
pub fn locate_sheet(photo: &RgbaImage, config: &SheetConfig) -> Result<RgbaImage, ScanError> {
    let gray = imageops::grayscale(photo);
    let binary = threshold(&gray, config.sheet_threshold, ThresholdType::Binary);

    // A frame that thresholds to all-foreground has no background to
    // separate the sheet from; the full-frame contour it would produce
    // is not a detection.
    if !binary.pixels().any(|p| p.0[0] == 0) {
        return Err(ScanError::SheetNotFound);
    }

    let contours = shape::external_contours(&binary);
    let bounds = shape::largest(&contours)
        .and_then(|c| shape::bounding_box(&c.points))
        .ok_or(ScanError::SheetNotFound)?;

    debug!(
        x = bounds.x,
        y = bounds.y,
        width = bounds.width,
        height = bounds.height,
        "located sheet"
    );

    let width = bounds.width.min(photo.width() - bounds.x);
    let height = bounds.height.min(photo.height() - bounds.y);
    Ok(imageops::crop_imm(photo, bounds.x, bounds.y, width, height).to_image())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Dark background with a bright "sheet" rectangle.
    fn photo_with_sheet(x0: u32, y0: u32, x1: u32, y1: u32) -> RgbaImage {
        RgbaImage::from_fn(100, 100, |x, y| {
            if x >= x0 && x < x1 && y >= y0 && y < y1 {
                image::Rgba([230, 230, 230, 255])
            } else {
                image::Rgba([30, 30, 30, 255])
            }
        })
    }

    #[test]
    fn crops_to_bright_region() {
        let photo = photo_with_sheet(20, 10, 80, 90);
        let sheet = locate_sheet(&photo, &SheetConfig::default()).unwrap();
        assert_eq!(sheet.width(), 60);
        assert_eq!(sheet.height(), 80);
        assert_eq!(sheet.get_pixel(0, 0).0[0], 230);
    }

    #[test]
    fn picks_largest_of_two_bright_regions() {
        let mut photo = photo_with_sheet(40, 40, 90, 90);
        for y in 5..15 {
            for x in 5..15 {
                photo.put_pixel(x, y, image::Rgba([250, 250, 250, 255]));
            }
        }
        let sheet = locate_sheet(&photo, &SheetConfig::default());
        assert_eq!(sheet.map(|s| (s.width(), s.height())).ok(), Some((50, 50)));
    }

    #[test]
    fn blank_white_photo_is_not_a_sheet() {
        let photo = RgbaImage::from_fn(50, 50, |_, _| image::Rgba([255, 255, 255, 255]));
        let result = locate_sheet(&photo, &SheetConfig::default());
        assert!(matches!(result, Err(ScanError::SheetNotFound)));
    }

    #[test]
    fn blank_dark_photo_is_not_a_sheet() {
        let photo = RgbaImage::from_fn(50, 50, |_, _| image::Rgba([20, 20, 20, 255]));
        let result = locate_sheet(&photo, &SheetConfig::default());
        assert!(matches!(result, Err(ScanError::SheetNotFound)));
    }

    #[test]
    fn threshold_is_configurable() {
        // A 150-brightness sheet is foreground at the default cut of 140
        // but background at a 200 cut.
        let photo = RgbaImage::from_fn(60, 60, |x, y| {
            if x >= 10 && x < 50 && y >= 10 && y < 50 {
                image::Rgba([150, 150, 150, 255])
            } else {
                image::Rgba([10, 10, 10, 255])
            }
        });
        assert!(locate_sheet(&photo, &SheetConfig::default()).is_ok());

        let strict = SheetConfig {
            sheet_threshold: 200,
            ..SheetConfig::default()
        };
        assert!(matches!(
            locate_sheet(&photo, &strict),
            Err(ScanError::SheetNotFound)
        ));
    }
}
