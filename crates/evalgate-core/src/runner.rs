use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use evalgate_types::{EvalReport, GeneratedOutput, Sample, ScoreRecord};

use crate::aggregate::aggregate;
use crate::error::EvalError;
use crate::evaluator::Evaluator;
use crate::evaluators::faithfulness::FaithfulnessEvaluator;
use crate::evaluators::format_accuracy::FormatAccuracyEvaluator;
use crate::evaluators::relevance::RelevanceEvaluator;

/// The standard evaluator set, in registration order.
pub fn default_evaluators() -> Vec<Arc<dyn Evaluator>> {
    vec![
        Arc::new(FaithfulnessEvaluator),
        Arc::new(RelevanceEvaluator),
        Arc::new(FormatAccuracyEvaluator),
    ]
}

pub struct EvalBuilder {
    dataset: Option<Vec<Sample>>,
    outputs: Option<Vec<GeneratedOutput>>,
    evaluators: Vec<Arc<dyn Evaluator>>,
}

impl EvalBuilder {
    pub fn new() -> Self {
        Self { dataset: None, outputs: None, evaluators: Vec::new() }
    }

    pub fn dataset(mut self, samples: Vec<Sample>) -> Self {
        self.dataset = Some(samples);
        self
    }

    pub fn outputs(mut self, outputs: Vec<GeneratedOutput>) -> Self {
        self.outputs = Some(outputs);
        self
    }

    pub fn evaluators<I>(mut self, evaluators: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Evaluator>>,
    {
        self.evaluators = evaluators.into_iter().collect();
        self
    }

    pub fn add_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluators.push(evaluator);
        self
    }

    pub fn build(self) -> Result<Eval> {
        Ok(Eval {
            dataset: self.dataset.ok_or_else(|| anyhow::anyhow!("dataset must be set"))?,
            outputs: self.outputs.ok_or_else(|| anyhow::anyhow!("outputs must be set"))?,
            evaluators: if self.evaluators.is_empty() {
                default_evaluators()
            } else {
                self.evaluators
            },
        })
    }
}

impl Default for EvalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The run orchestrator: joins generated outputs to samples by id, applies
/// every evaluator to each pair, and aggregates. Holds no scoring logic of
/// its own. Scoring is sequential; each record is computed independently.
pub struct Eval {
    dataset: Vec<Sample>,
    outputs: Vec<GeneratedOutput>,
    evaluators: Vec<Arc<dyn Evaluator>>,
}

impl Eval {
    pub fn builder() -> EvalBuilder {
        EvalBuilder::new()
    }

    /// An output id with no matching sample is a configuration error and
    /// aborts the whole run; no partial report is produced.
    pub fn run(&self) -> Result<EvalReport, EvalError> {
        let samples: HashMap<&str, &Sample> =
            self.dataset.iter().map(|s| (s.id.as_str(), s)).collect();

        let mut records = Vec::with_capacity(self.outputs.len());
        for generated in &self.outputs {
            let sample = samples
                .get(generated.id.as_str())
                .ok_or_else(|| EvalError::UnknownSampleId { id: generated.id.clone() })?;

            let mut scores = BTreeMap::new();
            for evaluator in &self.evaluators {
                let reported =
                    evaluator.score(&sample.input, &generated.output, &sample.expected_output);
                for (metric, value) in reported {
                    if scores.insert(metric.clone(), value).is_some() {
                        return Err(EvalError::DuplicateMetric {
                            evaluator: evaluator.name().to_string(),
                            metric,
                        });
                    }
                }
            }
            records.push(ScoreRecord { sample_id: generated.id.clone(), scores });
        }

        let aggregates = aggregate(&records);
        Ok(EvalReport { records, aggregates })
    }
}
