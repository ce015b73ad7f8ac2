//! Identifier reading: decode the machine-readable symbols printed
//! above the answer grid, then cut them out of the frame.
//!
//! Decoding runs on the plain grayscale first; if nothing decodes, a
//! second pass softens sensor noise with a Gaussian blur and stretches
//! washed-out contrast with histogram equalization before retrying.

use image::{GrayImage, imageops};
use imageproc::contrast::equalize_histogram;
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use crate::types::{BoundingBox, IdentifierRecord, RgbaImage, ScanError, SheetConfig};

/// Decode every identifier symbol found on the sheet crop.
///
/// An empty result means no symbol decoded on either pass; it is the
/// caller's call whether that is fatal.
#[must_use]
pub fn read_identifiers(sheet: &RgbaImage, config: &SheetConfig) -> Vec<IdentifierRecord> {
    let gray = imageops::grayscale(sheet);

    let records = decode_symbols(&gray);
    if !records.is_empty() {
        debug!(count = records.len(), "decoded identifiers on first pass");
        return records;
    }

    let softened = gaussian_blur_f32(&gray, config.identifier_blur_sigma);
    let enhanced = equalize_histogram(&softened);
    let records = decode_symbols(&enhanced);
    debug!(count = records.len(), "decoded identifiers on enhanced pass");
    records
}

/// Crop the sheet to the region below the lowest identifier symbol.
///
/// # Errors
///
/// Returns [`ScanError::IdentifierNotFound`] if `records` is empty and
/// [`ScanError::GridRegionEmpty`] if nothing remains below the symbols.
pub fn crop_below_identifiers(
    sheet: &RgbaImage,
    records: &[IdentifierRecord],
) -> Result<RgbaImage, ScanError> {
    let cutoff = records
        .iter()
        .map(|r| r.bounding_box.bottom())
        .max()
        .ok_or(ScanError::IdentifierNotFound)?;

    if cutoff >= sheet.height() {
        return Err(ScanError::GridRegionEmpty);
    }

    Ok(imageops::crop_imm(sheet, 0, cutoff, sheet.width(), sheet.height() - cutoff).to_image())
}

/// Run the QR detector over a grayscale raster.
///
/// Grids that detect but fail to decode are dropped; a misread payload
/// is worse than a missing one.
fn decode_symbols(gray: &GrayImage) -> Vec<IdentifierRecord> {
    let width = gray.width() as usize;
    let pixels = gray.as_raw();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width,
        gray.height() as usize,
        |x, y| pixels[y * width + x],
    );

    prepared
        .detect_grids()
        .into_iter()
        .filter_map(|grid| {
            let bounding_box = corner_bounds(&grid.bounds)?;
            let (_, payload) = grid.decode().ok()?;
            Some(IdentifierRecord {
                payload,
                bounding_box,
            })
        })
        .collect()
}

/// Bounding box of a detected symbol's four corner points.
///
/// The detector can report corners slightly outside the frame on a
/// tilted symbol; negative coordinates clamp to the image edge.
fn corner_bounds(corners: &[rqrr::Point; 4]) -> Option<BoundingBox> {
    let min_x = corners.iter().map(|p| p.x).min()?.max(0);
    let min_y = corners.iter().map(|p| p.y).min()?.max(0);
    let max_x = corners.iter().map(|p| p.x).max()?.max(0);
    let max_y = corners.iter().map(|p| p.y).max()?.max(0);

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_sheet_decodes_nothing() {
        let sheet = RgbaImage::from_fn(64, 64, |_, _| image::Rgba([255, 255, 255, 255]));
        let records = read_identifiers(&sheet, &SheetConfig::default());
        assert!(records.is_empty());
    }

    #[test]
    fn crop_without_records_is_identifier_not_found() {
        let sheet = RgbaImage::new(40, 60);
        let result = crop_below_identifiers(&sheet, &[]);
        assert!(matches!(result, Err(ScanError::IdentifierNotFound)));
    }

    #[test]
    fn crop_keeps_region_below_lowest_symbol() {
        let sheet = RgbaImage::from_fn(40, 60, |_, y| {
            let v = u8::try_from(y * 4).unwrap_or(255);
            image::Rgba([v, v, v, 255])
        });
        let records = vec![
            IdentifierRecord {
                payload: "upper".to_owned(),
                bounding_box: BoundingBox::new(2, 2, 10, 10),
            },
            IdentifierRecord {
                payload: "lower".to_owned(),
                bounding_box: BoundingBox::new(20, 8, 10, 12),
            },
        ];
        let cropped = crop_below_identifiers(&sheet, &records);
        // Lowest symbol ends at y = 8 + 12 = 20.
        assert_eq!(cropped.map(|c| (c.width(), c.height())).ok(), Some((40, 40)));
    }

    #[test]
    fn symbol_at_bottom_edge_leaves_no_grid() {
        let sheet = RgbaImage::new(40, 30);
        let records = vec![IdentifierRecord {
            payload: "edge".to_owned(),
            bounding_box: BoundingBox::new(0, 10, 20, 20),
        }];
        let result = crop_below_identifiers(&sheet, &records);
        assert!(matches!(result, Err(ScanError::GridRegionEmpty)));
    }

    #[test]
    fn corner_bounds_clamp_negative_coordinates() {
        let corners = [
            rqrr::Point { x: -3, y: -1 },
            rqrr::Point { x: 12, y: 0 },
            rqrr::Point { x: 12, y: 14 },
            rqrr::Point { x: 0, y: 14 },
        ];
        let bb = corner_bounds(&corners);
        assert_eq!(bb, Some(BoundingBox::new(0, 0, 13, 15)));
    }
}
