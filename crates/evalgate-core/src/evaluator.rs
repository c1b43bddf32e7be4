use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

/// Metric name → score in [0, 1].
pub type ScoreMap = BTreeMap<String, f64>;

/// Scores one (sample, output) pair. Implementations are pure: deterministic
/// for identical inputs, no I/O, no shared state. They never fail — malformed
/// inputs degrade to a sentinel score so one corrupt sample cannot abort a
/// run. Metric names across evaluators must be disjoint.
pub trait Evaluator: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, input_text: &str, model_output: &Value, expected_output: &Value) -> ScoreMap;
}

pub(crate) fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Share of reference tokens that also occur in the output, capped at 1.0.
/// Tokens are lowercased and whitespace-split; duplicates collapse. An empty
/// reference set scores 0.0: nothing can be measured against it.
pub(crate) fn token_overlap(reference: &str, output: &str) -> f64 {
    let reference = token_set(reference);
    if reference.is_empty() {
        return 0.0;
    }
    let output = token_set(output);
    let overlap = reference.intersection(&output).count();
    round3((overlap as f64 / reference.len() as f64).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_case_insensitive_and_set_based() {
        assert_eq!(token_overlap("The CAT cat", "the cat"), 1.0);
    }

    #[test]
    fn overlap_rounds_to_three_decimals() {
        assert_eq!(token_overlap("alpha beta gamma", "alpha"), 0.333);
    }

    #[test]
    fn empty_reference_scores_zero() {
        assert_eq!(token_overlap("", "anything"), 0.0);
        assert_eq!(token_overlap("   ", "anything"), 0.0);
    }

    #[test]
    fn overlap_stays_in_unit_interval() {
        for (reference, output) in [
            ("a b c", "a b c d e"),
            ("a", ""),
            ("x y", "y"),
            ("lorem ipsum dolor", "dolor sit amet"),
        ] {
            let score = token_overlap(reference, output);
            assert!((0.0..=1.0).contains(&score), "{score} out of range");
        }
    }
}
