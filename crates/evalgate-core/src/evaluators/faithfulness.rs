use serde_json::Value;

use crate::evaluator::{token_overlap, Evaluator, ScoreMap};

/// Token overlap between the model output and the expected output.
/// Applies only when the expected output is text: a structured expectation
/// makes no faithfulness claim, so the sample scores 1.0.
pub struct FaithfulnessEvaluator;

impl Evaluator for FaithfulnessEvaluator {
    fn name(&self) -> &'static str {
        "faithfulness"
    }

    fn score(&self, _input_text: &str, model_output: &Value, expected_output: &Value) -> ScoreMap {
        let value = match (expected_output, model_output) {
            (Value::String(expected), Value::String(output)) => token_overlap(expected, output),
            (Value::String(_), _) => 0.0,
            _ => 1.0,
        };
        ScoreMap::from([(self.name().to_string(), value)])
    }
}
