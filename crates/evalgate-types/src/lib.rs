use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

/// One golden-dataset record: an input prompt and the output we expect.
/// `expected_output` is either a text value or a structured mapping;
/// evaluators match on the variant to decide applicability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub input: String,
    pub expected_output: Value,
}

impl Sample {
    pub fn new(id: impl Into<String>, input: impl Into<String>, expected_output: Value) -> Self {
        Self { id: id.into(), input: input.into(), expected_output }
    }
}

/// What the model produced for one sample. The `input` field is carried
/// through from the inference run for traceability; scoring ignores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedOutput {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub output: Value,
}

impl GeneratedOutput {
    pub fn new(id: impl Into<String>, output: Value) -> Self {
        Self { id: id.into(), input: None, output }
    }
}

/// Per-sample scores, one entry per metric. Metric names across evaluators
/// are disjoint: each evaluator owns its namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "id")]
    pub sample_id: String,
    pub scores: BTreeMap<String, f64>,
}

/// Mean of each metric over the records that reported it.
pub type AggregateMetrics = BTreeMap<String, f64>;

/// Everything a scoring run produces: the per-sample records (what the
/// results file holds) and their aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub records: Vec<ScoreRecord>,
    pub aggregates: AggregateMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
struct SummaryRow {
    id: String,
    avg_score: f64,
    scores: String,
}

impl EvalReport {
    pub fn summary_table(&self) -> String {
        use tabled::Table;
        let rows: Vec<SummaryRow> = self
            .records
            .iter()
            .map(|r| {
                let avg = if r.scores.is_empty() {
                    0.0
                } else {
                    let sum: f64 = r.scores.values().sum();
                    sum / (r.scores.len() as f64)
                };
                let scores = r
                    .scores
                    .iter()
                    .map(|(name, value)| format!("{name}={value:.3}"))
                    .collect::<Vec<_>>()
                    .join("  ");
                SummaryRow {
                    id: r.sample_id.clone(),
                    avg_score: avg,
                    scores: truncate(scores, 96),
                }
            })
            .collect();

        let table = Table::new(rows).to_string();

        let aggregates = self
            .aggregates
            .iter()
            .map(|(name, value)| format!("{name}: {value:.3}"))
            .collect::<Vec<_>>()
            .join("  ");

        format!("{}\n\nSamples: {}  Aggregates: {}\n", table, self.records.len(), aggregates)
    }
}

fn truncate(s: String, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s;
    }
    let mut truncated = s.chars().take(max_len.saturating_sub(1)).collect::<String>();
    truncated.push('…');
    truncated
}
