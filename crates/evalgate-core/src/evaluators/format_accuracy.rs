use serde_json::Value;

use crate::evaluator::{Evaluator, ScoreMap};

/// Checks that a structured expectation is met by the model output: the
/// output must be text holding a parseable JSON document that contains every
/// key of the expected mapping. Presence-only — values are deliberately not
/// compared. Text expectations are out of this evaluator's scope and score
/// 1.0.
pub struct FormatAccuracyEvaluator;

impl Evaluator for FormatAccuracyEvaluator {
    fn name(&self) -> &'static str {
        "format_accuracy"
    }

    fn score(&self, _input_text: &str, model_output: &Value, expected_output: &Value) -> ScoreMap {
        let Value::Object(expected) = expected_output else {
            return ScoreMap::from([(self.name().to_string(), 1.0)]);
        };

        let value = match model_output {
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(parsed) => {
                    let all_present = expected.keys().all(|key| parsed.get(key).is_some());
                    if all_present {
                        1.0
                    } else {
                        0.0
                    }
                }
                Err(_) => 0.0,
            },
            _ => 0.0,
        };
        ScoreMap::from([(self.name().to_string(), value)])
    }
}
