use std::path::Path;

use anyhow::{Context, Result};
use evalgate_types::{AggregateMetrics, GeneratedOutput, Sample};
use serde::Deserialize;

use crate::regression::RegressionConfig;

#[derive(Deserialize)]
struct DatasetFile {
    samples: Vec<Sample>,
}

/// Golden dataset: `{"samples": [{"id", "input", "expected_output"}, ...]}`.
pub async fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    let content = read(path, "dataset").await?;
    let file: DatasetFile = serde_json::from_str(&content)
        .with_context(|| format!("Invalid dataset JSON in {}", path.display()))?;
    Ok(file.samples)
}

/// Model outputs: a JSON array of `{"id", "input"?, "output"}`.
pub async fn load_outputs(path: impl AsRef<Path>) -> Result<Vec<GeneratedOutput>> {
    let path = path.as_ref();
    let content = read(path, "outputs").await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid outputs JSON in {}", path.display()))
}

/// Regression policy: `{metric: {"min_score"?, "max_delta"?}}`.
pub async fn load_regression_config(path: impl AsRef<Path>) -> Result<RegressionConfig> {
    let path = path.as_ref();
    let content = read(path, "regression config").await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid regression config JSON in {}", path.display()))
}

/// Baseline aggregates from a prior accepted run: `{metric: mean}`.
pub async fn load_baseline(path: impl AsRef<Path>) -> Result<AggregateMetrics> {
    let path = path.as_ref();
    let content = read(path, "baseline").await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid baseline JSON in {}", path.display()))
}

async fn read(path: &Path, what: &str) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {} file {}", what, path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("evalgate-{}-{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn loads_dataset_samples() {
        let path = temp_path("dataset.json");
        std::fs::write(
            &path,
            r#"{"samples": [
                {"id": "s1", "input": "the cat sat", "expected_output": "the cat sat on the mat"},
                {"id": "s2", "input": "give me json", "expected_output": {"name": "x"}}
            ]}"#,
        )
        .unwrap();

        let samples = load_dataset(&path).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].id, "s1");
        assert_eq!(samples[1].expected_output, json!({"name": "x"}));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn loads_outputs_array() {
        let path = temp_path("outputs.json");
        std::fs::write(
            &path,
            r#"[{"id": "s1", "input": "the cat sat", "output": "the cat sat on the mat"}]"#,
        )
        .unwrap();

        let outputs = load_outputs(&path).await.unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].output, json!("the cat sat on the mat"));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn loads_regression_rules() {
        let path = temp_path("policy.json");
        std::fs::write(
            &path,
            r#"{"faithfulness": {"min_score": 0.8}, "relevance": {"max_delta": 0.05}}"#,
        )
        .unwrap();

        let config = load_regression_config(&path).await.unwrap();
        assert_eq!(config["faithfulness"].min_score, Some(0.8));
        assert_eq!(config["faithfulness"].max_delta, None);
        assert_eq!(config["relevance"].max_delta, Some(0.05));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn missing_file_error_names_the_path() {
        let err = load_dataset("/no/such/evalgate-dataset.json").await.unwrap_err();
        assert!(err.to_string().contains("evalgate-dataset.json"));
    }
}
