use std::collections::BTreeMap;

use evalgate_types::{AggregateMetrics, ScoreRecord};

use crate::evaluator::round3;

/// Mean of every metric over the records that reported it, rounded to 3
/// decimals. A record that did not report a metric is excluded from that
/// metric's numerator and denominator, not counted as zero, so the result is
/// independent of record order. Metrics reported by no record are absent.
pub fn aggregate(records: &[ScoreRecord]) -> AggregateMetrics {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for record in records {
        for (metric, value) in &record.scores {
            *totals.entry(metric.as_str()).or_insert(0.0) += *value;
            *counts.entry(metric.as_str()).or_insert(0) += 1;
        }
    }

    totals
        .into_iter()
        .map(|(metric, total)| (metric.to_string(), round3(total / counts[metric] as f64)))
        .collect()
}
