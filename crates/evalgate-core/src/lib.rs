//! evalgate-core: deterministic offline evaluation of LLM outputs.
//! Join a golden dataset with generated outputs, score each pair with a set
//! of evaluators, aggregate per-metric means, and gate on a regression policy.
//! See `examples/simple.rs` for a quickstart.

pub mod aggregate;
pub mod client;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod regression;
pub mod runner;
pub mod tracking;

pub mod evaluators {
    pub mod faithfulness;
    pub mod format_accuracy;
    pub mod relevance;
}

pub use aggregate::aggregate;
pub use client::{ModelClient, OllamaClient};
pub use config::{load_prompts, load_run_config, RunConfig};
pub use dataset::{load_baseline, load_dataset, load_outputs, load_regression_config};
pub use error::EvalError;
pub use evaluator::{Evaluator, ScoreMap};
pub use evaluators::{
    faithfulness::FaithfulnessEvaluator, format_accuracy::FormatAccuracyEvaluator,
    relevance::RelevanceEvaluator,
};
pub use regression::{
    RegressionConfig, RegressionDetector, RegressionResult, RegressionStatus, RuleSet,
};
pub use runner::{default_evaluators, Eval, EvalBuilder};
pub use tracking::{with_run, NoopTracker, Tracker};

pub use evalgate_types::{AggregateMetrics, EvalReport, GeneratedOutput, Sample, ScoreRecord};
