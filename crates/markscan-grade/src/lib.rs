//! markscan-grade: Mark resolution and scoring (sans-IO).
//!
//! Consumes the structured [`SheetReading`] produced by
//! `markscan-pipeline`, resolves detected marks against the labeled
//! header spans, and scores the result against a caller-supplied
//! answer key.

pub mod agreement;
pub mod score;

pub use agreement::percentage_agreement;
pub use score::{AnswerKeyEntry, ScanResult, ScoredAnswer, resolve_marks, score};

pub use markscan_pipeline::{ScanError, SheetConfig, SheetReading};

/// Scan a photographed sheet and score it in one call.
///
/// Runs the full geometric pipeline on `image_bytes`, then scores the
/// reading against `key`. `test_id` is echoed back in the result so a
/// batch caller can correlate reports with inputs.
///
/// # Errors
///
/// Propagates every [`ScanError`] the pipeline can produce; scoring
/// itself cannot fail.
pub fn scan(
    image_bytes: &[u8],
    key: &[AnswerKeyEntry],
    test_id: &str,
    config: &SheetConfig,
) -> Result<ScanResult, ScanError> {
    let reading = markscan_pipeline::process(image_bytes, config)?;
    Ok(score::score(&reading, key, test_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_propagates_pipeline_errors() {
        let result = scan(&[], &[], "t-1", &SheetConfig::default());
        assert!(matches!(result, Err(ScanError::EmptyInput)));
    }
}
