//! Grid inference: classify the blobs of the rectified grid into ruler
//! headers and interior cells, then label the headers.
//!
//! The rectified template prints dark grid lines on bright paper, so
//! after an Otsu cut every cell and ruler mark is an isolated bright
//! blob. Position of the blob's origin decides its role: the top strip
//! holds answer headers, the left strip holds question headers, and
//! everything past both margins is an answerable cell.

use image::imageops;
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::filter::bilateral_filter;
use tracing::debug;

use crate::shape;
use crate::types::{Header, RgbaImage, Shape, SheetConfig};

const ANSWER_LABELS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// The classified blobs of one rectified grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    /// Question headers, top to bottom, labeled "1", "2", ….
    pub questions: Vec<Header>,
    /// Answer headers, left to right, labeled "A" through "Z".
    pub answers: Vec<Header>,
    /// Interior cells, unordered.
    pub cells: Vec<Shape>,
}

/// Classify and label the blobs of a rectified grid image.
#[must_use]
pub fn infer_grid(rectified: &RgbaImage, config: &SheetConfig) -> GridLayout {
    let gray = imageops::grayscale(rectified);
    let smoothed = bilateral_filter(
        &gray,
        config.smoothing_window,
        config.smoothing_sigma,
        config.smoothing_sigma,
    );
    let level = otsu_level(&smoothed);
    let binary = threshold(&smoothed, level, ThresholdType::Binary);

    let shapes = shape::external_shapes(&binary);

    let answer_candidates: Vec<Shape> = shapes
        .iter()
        .filter(|s| s.bounding_box.y < config.ruler_margin)
        .cloned()
        .collect();
    let question_candidates: Vec<Shape> = shapes
        .iter()
        .filter(|s| s.bounding_box.x < config.ruler_margin)
        .cloned()
        .collect();
    let cells: Vec<Shape> = shapes
        .into_iter()
        .filter(|s| {
            s.bounding_box.x > config.interior_margin && s.bounding_box.y > config.ruler_margin
        })
        .collect();

    let questions = question_headers(question_candidates, config);
    let answers = answer_headers(answer_candidates, config);
    debug!(
        questions = questions.len(),
        answers = answers.len(),
        cells = cells.len(),
        "inferred grid"
    );

    GridLayout {
        questions,
        answers,
        cells,
    }
}

/// Reduce top-strip candidates to labeled answer headers.
///
/// Drops the corner blob shared with the left strip, orders left to
/// right, drops noise specks, and assigns letters. More than 26
/// surviving headers is a template violation; the extras go unlabeled.
fn answer_headers(mut candidates: Vec<Shape>, config: &SheetConfig) -> Vec<Header> {
    candidates.retain(|s| s.bounding_box.x >= config.answer_corner_exclusion);
    candidates.sort_by_key(|s| s.bounding_box.x);
    candidates.retain(|s| s.area > config.min_shape_area);

    ANSWER_LABELS
        .chars()
        .zip(candidates)
        .map(|(letter, s)| Header {
            label: letter.to_string(),
            extent: s.bounding_box,
        })
        .collect()
}

/// Reduce left-strip candidates to labeled question headers.
///
/// Drops the corner blob, orders top to bottom, drops noise specks,
/// collapses duplicate detections of the same ruler mark, and numbers
/// the survivors from 1.
fn question_headers(mut candidates: Vec<Shape>, config: &SheetConfig) -> Vec<Header> {
    candidates.retain(|s| s.bounding_box.y >= config.question_corner_exclusion);
    candidates.sort_by_key(|s| s.bounding_box.y);
    candidates.retain(|s| s.area > config.min_shape_area);

    let mut deduped: Vec<Shape> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let duplicate = deduped.iter().any(|kept| {
            kept.bounding_box.y.abs_diff(candidate.bounding_box.y) < config.dedup_distance
        });
        if !duplicate {
            deduped.push(candidate);
        }
    }

    deduped
        .into_iter()
        .enumerate()
        .map(|(i, s)| Header {
            label: (i + 1).to_string(),
            extent: s.bounding_box,
        })
        .collect()
}
