use thiserror::Error;

/// Fatal pipeline conditions. These abort a run before any results are
/// written; recoverable per-sample problems are encoded as sentinel scores
/// by the evaluators instead.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("generated output references unknown sample id '{id}'")]
    UnknownSampleId { id: String },

    #[error("evaluator '{evaluator}' reported metric '{metric}', which an earlier evaluator already owns")]
    DuplicateMetric { evaluator: String, metric: String },
}
