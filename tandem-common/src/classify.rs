//! Two-participant result classification

use crate::model::Choice;
use serde::{Deserialize, Serialize};

/// Outcome of one item once both participants have rated it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Both said yes
    Match,
    /// No "no" votes and at least one neutral
    Neutral,
    /// At least one "no"
    Rejected,
}

/// Classify a pair of choices
///
/// `No` wins over everything, then two `Yes` votes match, anything else is
/// neutral.
pub fn classify(a: Choice, b: Choice) -> Verdict {
    match (a, b) {
        (Choice::No, _) | (_, Choice::No) => Verdict::Rejected,
        (Choice::Yes, Choice::Yes) => Verdict::Match,
        _ => Verdict::Neutral,
    }
}

/// Classify a recorded choice set; `None` unless exactly two choices exist
pub fn classify_all(choices: &[Choice]) -> Option<Verdict> {
    match choices {
        [a, b] => Some(classify(*a, *b)),
        _ => None,
    }
}
