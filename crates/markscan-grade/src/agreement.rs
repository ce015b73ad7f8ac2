//! Pair-set agreement: how closely one resolved answer set matches
//! a reference set.
//!
//! Useful for validating the pipeline against a hand-graded sheet: the
//! reference pairs come from a human, the provided pairs from
//! [`crate::score::resolve_marks`].

use std::collections::BTreeSet;

/// Percentage of reference pairs present in the provided set.
///
/// Returns `None` when the reference set is empty, since agreement
/// with nothing is undefined.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage_agreement(
    reference: &BTreeSet<(String, String)>,
    provided: &BTreeSet<(String, String)>,
) -> Option<f64> {
    if reference.is_empty() {
        return None;
    }
    let matching = reference.iter().filter(|pair| provided.contains(*pair)).count();
    Some(matching as f64 / reference.len() as f64 * 100.0)
}
