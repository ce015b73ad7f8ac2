//! markscan-pipeline: Pure answer-sheet scanning pipeline (sans-IO).
//!
//! Converts a photographed bubble answer sheet into a structured
//! reading through:
//! decode -> sheet location -> identifier decode -> grid crop ->
//! rectification -> grid inference -> mark detection.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Grading and file handling
//! live in downstream crates.

pub mod decode;
pub mod grid;
pub mod identifier;
pub mod marks;
pub mod rectify;
pub mod shape;
pub mod sheet;
pub mod types;

pub use grid::GridLayout;
pub use types::{
    BoundingBox, Header, IdentifierRecord, MarkPoint, ScanError, Shape, SheetConfig, SheetReading,
};

use tracing::info;

/// Run the full sheet-scanning pipeline.
///
/// Takes raw photo bytes (PNG, JPEG, BMP, WebP) and a configuration,
/// then produces a [`SheetReading`]: the decoded identifier payloads,
/// the labeled question and answer headers, and the centers of every
/// marked cell, all in rectified-grid coordinates.
///
/// # Pipeline steps
///
/// 1. Decode the photo bytes
/// 2. Locate the sheet and crop to it
/// 3. Decode the identifier symbols printed above the grid
/// 4. Crop to the region below the lowest identifier
/// 5. Re-locate within that region (the grid is its own bright blob)
/// 6. Rectify: four corners, projective warp, quarter turn
/// 7. Infer the grid: headers and interior cells, labeled
/// 8. Detect marked cells
///
/// # Errors
///
/// Returns [`ScanError::EmptyInput`] if `image_bytes` is empty and
/// [`ScanError::ImageDecode`] if it does not decode. The remaining
/// variants mirror the stages: [`ScanError::SheetNotFound`],
/// [`ScanError::IdentifierNotFound`], [`ScanError::GridRegionEmpty`],
/// and [`ScanError::CornerDetectionFailed`].
pub fn process(image_bytes: &[u8], config: &SheetConfig) -> Result<SheetReading, ScanError> {
    // 1. Decode the photo.
    let photo = decode::decode_image(image_bytes)?;

    // 2. Locate the sheet.
    let sheet = sheet::locate_sheet(&photo, config)?;

    // 3. Decode the identifier symbols.
    let records = identifier::read_identifiers(&sheet, config);
    let identifier_payloads: Vec<String> = records.iter().map(|r| r.payload.clone()).collect();

    // 4. Crop below the lowest identifier.
    let below = identifier::crop_below_identifiers(&sheet, &records)?;

    // 5. Re-locate within the identifier-free region. A failure here
    //    means the region held no usable content, not that the photo
    //    had no sheet.
    let grid_region = sheet::locate_sheet(&below, config).map_err(|_| ScanError::GridRegionEmpty)?;

    // 6. Rectify the grid.
    let rectified = rectify::rectify(&grid_region, config)?;

    // 7. Infer headers and cells.
    let layout = grid::infer_grid(&rectified, config);

    // 8. Detect marked cells.
    let marks = marks::detect_marks(&rectified, &layout.cells, config);

    info!(
        identifiers = identifier_payloads.len(),
        questions = layout.questions.len(),
        answers = layout.answers.len(),
        marks = marks.len(),
        "scanned sheet"
    );

    Ok(SheetReading {
        identifier_payloads,
        questions: layout.questions,
        answers: layout.answers,
        marks,
    })
}
