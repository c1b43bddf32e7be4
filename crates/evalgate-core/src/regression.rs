use std::collections::BTreeMap;
use std::fmt;

use evalgate_types::AggregateMetrics;
use serde::{Deserialize, Serialize};

/// Thresholds for one metric. Both rules may be declared together; they are
/// checked independently and each can contribute its own violation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    /// Absolute floor for the candidate value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    /// Maximum tolerated drop from baseline to candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delta: Option<f64>,
}

pub type RegressionConfig = BTreeMap<String, RuleSet>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegressionStatus {
    Pass,
    Fail,
}

impl fmt::Display for RegressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegressionStatus::Pass => f.write_str("PASS"),
            RegressionStatus::Fail => f.write_str("FAIL"),
        }
    }
}

/// Verdict of one baseline/candidate comparison. A `Fail` is a normal,
/// reportable outcome, not a pipeline error; `status` is `Fail` iff
/// `details` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub status: RegressionStatus,
    pub details: Vec<String>,
}

/// Compares aggregate metrics of two runs under a declared policy.
pub struct RegressionDetector {
    config: RegressionConfig,
}

impl RegressionDetector {
    pub fn new(config: RegressionConfig) -> Self {
        Self { config }
    }

    /// Pure comparison: identical inputs always yield the identical verdict,
    /// so the result can gate CI deterministically. Config metrics are
    /// visited in sorted order, `min_score` before `max_delta`, and a rule
    /// naming a metric neither run reported is inert.
    pub fn compare(
        &self,
        baseline: &AggregateMetrics,
        candidate: &AggregateMetrics,
    ) -> RegressionResult {
        let mut details = Vec::new();

        for (metric, rules) in &self.config {
            if !baseline.contains_key(metric) && !candidate.contains_key(metric) {
                continue;
            }
            let observed = candidate.get(metric).copied().unwrap_or(0.0);

            if let Some(min_score) = rules.min_score {
                if observed < min_score {
                    details.push(format!(
                        "{metric}: score {observed:.3} is below the minimum {min_score:.3}"
                    ));
                }
            }

            if let Some(max_delta) = rules.max_delta {
                let base = baseline.get(metric).copied().unwrap_or(0.0);
                let drop = base - observed;
                if drop > max_delta {
                    details.push(format!(
                        "{metric}: dropped {drop:.3} from baseline, more than the allowed {max_delta:.3}"
                    ));
                }
            }
        }

        let status = if details.is_empty() {
            RegressionStatus::Pass
        } else {
            RegressionStatus::Fail
        };
        RegressionResult { status, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(entries: &[(&str, f64)]) -> AggregateMetrics {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn config(entries: &[(&str, RuleSet)]) -> RegressionConfig {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn candidate_below_floor_fails_with_one_detail() {
        let detector = RegressionDetector::new(config(&[(
            "faithfulness",
            RuleSet { min_score: Some(0.8), max_delta: None },
        )]));
        let candidate = metrics(&[("faithfulness", 0.5)]);
        let result = detector.compare(&candidate, &candidate);
        assert_eq!(result.status, RegressionStatus::Fail);
        assert_eq!(result.details.len(), 1);
        assert!(result.details[0].contains("faithfulness"));
    }

    #[test]
    fn unchanged_metric_within_delta_passes() {
        let detector = RegressionDetector::new(config(&[(
            "relevance",
            RuleSet { min_score: None, max_delta: Some(0.05) },
        )]));
        let baseline = metrics(&[("relevance", 0.9)]);
        let candidate = metrics(&[("relevance", 0.9)]);
        let result = detector.compare(&baseline, &candidate);
        assert_eq!(result.status, RegressionStatus::Pass);
        assert!(result.details.is_empty());
    }

    #[test]
    fn drop_beyond_delta_fails() {
        let detector = RegressionDetector::new(config(&[(
            "relevance",
            RuleSet { min_score: None, max_delta: Some(0.05) },
        )]));
        let result =
            detector.compare(&metrics(&[("relevance", 0.9)]), &metrics(&[("relevance", 0.8)]));
        assert_eq!(result.status, RegressionStatus::Fail);
        assert!(result.details[0].contains("relevance"));
    }

    #[test]
    fn both_rules_on_one_metric_are_additive() {
        let detector = RegressionDetector::new(config(&[(
            "faithfulness",
            RuleSet { min_score: Some(0.8), max_delta: Some(0.05) },
        )]));
        let result = detector
            .compare(&metrics(&[("faithfulness", 0.9)]), &metrics(&[("faithfulness", 0.5)]));
        assert_eq!(result.status, RegressionStatus::Fail);
        assert_eq!(result.details.len(), 2);
    }

    #[test]
    fn rule_for_a_metric_no_run_reported_is_inert() {
        let detector = RegressionDetector::new(config(&[(
            "toxicity",
            RuleSet { min_score: Some(0.99), max_delta: Some(0.0) },
        )]));
        let aggregates = metrics(&[("relevance", 0.9)]);
        let result = detector.compare(&aggregates, &aggregates);
        assert_eq!(result.status, RegressionStatus::Pass);
    }

    #[test]
    fn metric_missing_only_from_candidate_counts_as_zero() {
        let detector = RegressionDetector::new(config(&[(
            "relevance",
            RuleSet { min_score: Some(0.5), max_delta: None },
        )]));
        let result = detector.compare(&metrics(&[("relevance", 0.9)]), &metrics(&[]));
        assert_eq!(result.status, RegressionStatus::Fail);
        assert!(result.details[0].contains("0.000"));
    }

    #[test]
    fn comparison_is_deterministic() {
        let detector = RegressionDetector::new(config(&[
            ("faithfulness", RuleSet { min_score: Some(0.8), max_delta: None }),
            ("relevance", RuleSet { min_score: None, max_delta: Some(0.05) }),
        ]));
        let baseline = metrics(&[("faithfulness", 0.9), ("relevance", 0.9)]);
        let candidate = metrics(&[("faithfulness", 0.6), ("relevance", 0.7)]);
        let first = detector.compare(&baseline, &candidate);
        let second = detector.compare(&baseline, &candidate);
        assert_eq!(first, second);
    }

    #[test]
    fn status_fails_iff_details_non_empty() {
        let detector = RegressionDetector::new(config(&[(
            "relevance",
            RuleSet { min_score: Some(0.5), max_delta: None },
        )]));
        for value in [0.2, 0.5, 0.8] {
            let aggregates = metrics(&[("relevance", value)]);
            let result = detector.compare(&aggregates, &aggregates);
            assert_eq!(result.status == RegressionStatus::Fail, !result.details.is_empty());
        }
    }
}
