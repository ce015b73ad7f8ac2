//! Mark resolution and scoring.
//!
//! A mark point resolves to a (question, answer) pair when it falls
//! inside a question header's vertical span and an answer header's
//! horizontal span. Pairs live in a set: two marks in one cell are one
//! answer, and the output ordering never depends on detection order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use markscan_pipeline::SheetReading;

/// One entry of the answer key supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    /// Question label the entry applies to ("1", "2", …).
    pub question: String,
    /// Every answer letter accepted as correct for this question.
    pub correct_answer: BTreeSet<String>,
}

/// One resolved answer, as it appears in the scan report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    /// Question label.
    pub question: String,
    /// The answer letter given; empty when the question is not in the
    /// answer key, so a misprinted key is visible in the report.
    pub answer: String,
    /// Accepted answers from the key; `None` for keyless questions.
    pub correct_answer: Option<BTreeSet<String>>,
}

/// The scored report for one scanned sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Payloads of the identifier symbols decoded on the sheet.
    pub identifier_payloads: Vec<String>,
    /// Resolved answers, sorted by numeric question label.
    pub answers: Vec<ScoredAnswer>,
    /// Count of answers matching the key.
    pub total_correct: u32,
    /// Count of answers missing the key or not in it.
    pub total_incorrect: u32,
    /// Caller-supplied test identifier, echoed back.
    pub test_id: String,
}

/// Resolve detected marks into a set of (question, answer) pairs.
///
/// A mark inside overlapping header spans resolves to every containing
/// pair. Marks outside all spans resolve to nothing.
#[must_use]
pub fn resolve_marks(reading: &SheetReading) -> BTreeSet<(String, String)> {
    let mut pairs = BTreeSet::new();
    for mark in &reading.marks {
        for question in &reading.questions {
            if !question.extent.contains_y(mark.y) {
                continue;
            }
            for answer in &reading.answers {
                if answer.extent.contains_x(mark.x) {
                    pairs.insert((question.label.clone(), answer.label.clone()));
                }
            }
        }
    }
    pairs
}

/// Score a sheet reading against an answer key.
///
/// Every resolved pair produces exactly one [`ScoredAnswer`] and bumps
/// exactly one of the two totals. Duplicate key entries for a question
/// are ignored past the first.
#[must_use]
pub fn score(reading: &SheetReading, key: &[AnswerKeyEntry], test_id: &str) -> ScanResult {
    let pairs = resolve_marks(reading);
    debug!(pairs = pairs.len(), "resolved marks");

    let mut answers = Vec::with_capacity(pairs.len());
    let mut total_correct = 0u32;
    let mut total_incorrect = 0u32;

    for (question, answer) in pairs {
        match key.iter().find(|entry| entry.question == question) {
            Some(entry) => {
                if entry.correct_answer.contains(&answer) {
                    total_correct += 1;
                } else {
                    total_incorrect += 1;
                }
                answers.push(ScoredAnswer {
                    question,
                    answer,
                    correct_answer: Some(entry.correct_answer.clone()),
                });
            }
            None => {
                total_incorrect += 1;
                answers.push(ScoredAnswer {
                    question,
                    answer: String::new(),
                    correct_answer: None,
                });
            }
        }
    }

    answers.sort_by_key(|a| a.question.parse::<u64>().unwrap_or(u64::MAX));

    ScanResult {
        identifier_payloads: reading.identifier_payloads.clone(),
        answers,
        total_correct,
        total_incorrect,
        test_id: test_id.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markscan_pipeline::{BoundingBox, Header, MarkPoint};

    fn header(label: &str, x: u32, y: u32, width: u32, height: u32) -> Header {
        Header {
            label: label.to_owned(),
            extent: BoundingBox::new(x, y, width, height),
        }
    }

    /// Two questions ("1" at y 20..34, "2" at y 50..64) and two answers
    /// ("A" at x 20..34, "B" at x 50..64).
    fn reading(marks: Vec<MarkPoint>) -> SheetReading {
        SheetReading {
            identifier_payloads: vec!["student-42".to_owned()],
            questions: vec![header("1", 0, 20, 8, 14), header("2", 0, 50, 8, 14)],
            answers: vec![header("A", 20, 0, 14, 8), header("B", 50, 0, 14, 8)],
            marks,
        }
    }

    fn key(entries: &[(&str, &[&str])]) -> Vec<AnswerKeyEntry> {
        entries
            .iter()
            .map(|(q, a)| AnswerKeyEntry {
                question: (*q).to_owned(),
                correct_answer: accepted(a),
            })
            .collect()
    }

    fn accepted(letters: &[&str]) -> BTreeSet<String> {
        letters.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn mark_resolves_to_containing_pair() {
        let pairs = resolve_marks(&reading(vec![MarkPoint { x: 25, y: 55 }]));
        let expected: BTreeSet<_> = [("2".to_owned(), "A".to_owned())].into();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn mark_outside_all_spans_resolves_to_nothing() {
        let pairs = resolve_marks(&reading(vec![MarkPoint { x: 45, y: 45 }]));
        assert!(pairs.is_empty());
    }

    #[test]
    fn two_marks_in_one_cell_are_one_answer() {
        let pairs = resolve_marks(&reading(vec![
            MarkPoint { x: 22, y: 52 },
            MarkPoint { x: 30, y: 60 },
        ]));
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn overlapping_spans_resolve_to_every_pair() {
        let mut sheet = reading(vec![MarkPoint { x: 25, y: 30 }]);
        // A second question span overlapping the first at y = 30.
        sheet.questions.push(header("3", 0, 28, 8, 14));
        let pairs = resolve_marks(&sheet);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&("1".to_owned(), "A".to_owned())));
        assert!(pairs.contains(&("3".to_owned(), "A".to_owned())));
    }

    #[test]
    fn correct_answer_is_counted_and_recorded() {
        let result = score(
            &reading(vec![MarkPoint { x: 25, y: 55 }]),
            &key(&[("2", &["A"])]),
            "t-1",
        );
        assert_eq!(result.total_correct, 1);
        assert_eq!(result.total_incorrect, 0);
        assert_eq!(
            result.answers,
            vec![ScoredAnswer {
                question: "2".to_owned(),
                answer: "A".to_owned(),
                correct_answer: Some(accepted(&["A"])),
            }]
        );
        assert_eq!(result.test_id, "t-1");
        assert_eq!(result.identifier_payloads, vec!["student-42".to_owned()]);
    }

    #[test]
    fn wrong_answer_is_recorded_with_the_key() {
        let result = score(
            &reading(vec![MarkPoint { x: 55, y: 55 }]),
            &key(&[("2", &["A"])]),
            "t-1",
        );
        assert_eq!(result.total_correct, 0);
        assert_eq!(result.total_incorrect, 1);
        assert_eq!(
            result.answers,
            vec![ScoredAnswer {
                question: "2".to_owned(),
                answer: "B".to_owned(),
                correct_answer: Some(accepted(&["A"])),
            }]
        );
    }

    #[test]
    fn keyless_question_is_recorded_empty_and_incorrect() {
        let result = score(
            &reading(vec![MarkPoint { x: 25, y: 25 }]),
            &key(&[("2", &["A"])]),
            "t-1",
        );
        assert_eq!(result.total_correct, 0);
        assert_eq!(result.total_incorrect, 1);
        assert_eq!(
            result.answers,
            vec![ScoredAnswer {
                question: "1".to_owned(),
                answer: String::new(),
                correct_answer: None,
            }]
        );
    }

    #[test]
    fn totals_partition_the_answers() {
        let result = score(
            &reading(vec![
                MarkPoint { x: 25, y: 25 },
                MarkPoint { x: 55, y: 55 },
            ]),
            &key(&[("1", &["A"]), ("2", &["A"])]),
            "t-1",
        );
        assert_eq!(
            result.total_correct + result.total_incorrect,
            u32::try_from(result.answers.len()).unwrap_or(u32::MAX),
        );
        assert_eq!(result.total_correct, 1);
        assert_eq!(result.total_incorrect, 1);
    }

    #[test]
    fn answers_sort_numerically_not_lexically() {
        let mut sheet = reading(vec![
            MarkPoint { x: 25, y: 25 },
            MarkPoint { x: 25, y: 55 },
            MarkPoint { x: 25, y: 85 },
        ]);
        sheet.questions = vec![
            header("2", 0, 20, 8, 14),
            header("10", 0, 50, 8, 14),
            header("3", 0, 80, 8, 14),
        ];
        let result = score(&sheet, &key(&[]), "t-1");
        let order: Vec<&str> = result.answers.iter().map(|a| a.question.as_str()).collect();
        assert_eq!(order, ["2", "3", "10"]);
    }

    #[test]
    fn duplicate_key_entries_use_the_first() {
        let result = score(
            &reading(vec![MarkPoint { x: 25, y: 55 }]),
            &key(&[("2", &["A"]), ("2", &["B"])]),
            "t-1",
        );
        assert_eq!(result.total_correct, 1);
        assert_eq!(result.total_incorrect, 0);
        assert_eq!(result.answers.len(), 1);
    }

    #[test]
    fn scoring_is_idempotent_over_detection_order() {
        let forward = score(
            &reading(vec![
                MarkPoint { x: 25, y: 25 },
                MarkPoint { x: 55, y: 55 },
            ]),
            &key(&[("1", &["A"])]),
            "t-1",
        );
        let reversed = score(
            &reading(vec![
                MarkPoint { x: 55, y: 55 },
                MarkPoint { x: 25, y: 25 },
            ]),
            &key(&[("1", &["A"])]),
            "t-1",
        );
        assert_eq!(forward, reversed);
    }

    #[test]
    fn result_serializes_to_json() {
        let result = score(
            &reading(vec![MarkPoint { x: 25, y: 55 }]),
            &key(&[("2", &["A"])]),
            "t-1",
        );
        let json = serde_json::to_string(&result).ok();
        let parsed: Option<ScanResult> =
            json.as_deref().and_then(|j| serde_json::from_str(j).ok());
        assert_eq!(parsed, Some(result));
    }
}
