use serde_json::Value;

use crate::evaluator::{token_overlap, Evaluator, ScoreMap};

/// Token overlap between the model output and the *input* prompt: did the
/// answer stay on topic? Applicability mirrors faithfulness — only samples
/// with a text expected output are measured.
pub struct RelevanceEvaluator;

impl Evaluator for RelevanceEvaluator {
    fn name(&self) -> &'static str {
        "relevance"
    }

    fn score(&self, input_text: &str, model_output: &Value, expected_output: &Value) -> ScoreMap {
        let value = match (expected_output, model_output) {
            (Value::String(_), Value::String(output)) => token_overlap(input_text, output),
            (Value::String(_), _) => 0.0,
            _ => 1.0,
        };
        ScoreMap::from([(self.name().to_string(), value)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn output_echoing_the_input_scores_one() {
        let scores = RelevanceEvaluator.score(
            "the cat sat",
            &json!("the cat sat on the mat"),
            &json!("the cat sat on the mat"),
        );
        assert_eq!(scores["relevance"], 1.0);
    }

    #[test]
    fn denominator_is_the_input_not_the_expected_output() {
        let scores = RelevanceEvaluator.score(
            "one two three four",
            &json!("one two"),
            &json!("unrelated reference text"),
        );
        assert_eq!(scores["relevance"], 0.5);
    }

    #[test]
    fn structured_expected_output_is_not_applicable() {
        let scores = RelevanceEvaluator.score("prompt", &json!("output"), &json!({"k": 1}));
        assert_eq!(scores["relevance"], 1.0);
    }

    #[test]
    fn non_text_output_scores_zero() {
        let scores = RelevanceEvaluator.score("prompt", &json!(["a"]), &json!("expected"));
        assert_eq!(scores["relevance"], 0.0);
    }

    #[test]
    fn empty_input_scores_zero() {
        let scores = RelevanceEvaluator.score("", &json!("output"), &json!("expected"));
        assert_eq!(scores["relevance"], 0.0);
    }
}
