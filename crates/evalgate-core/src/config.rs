use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Parameters of one inference run, loaded from a JSON run-config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub prompt_version: String,
    #[serde(default = "default_version")]
    pub dataset_version: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
}

fn default_version() -> String {
    "v1".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_top_p() -> f64 {
    0.9
}

pub async fn load_run_config(path: impl AsRef<Path>) -> Result<RunConfig> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read run config file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid run config JSON in {}", path.display()))
}

/// Prompt templates for a version: `<dir>/<version>/system.txt` and
/// `<dir>/<version>/user.txt`. The user template carries an `{{input}}`
/// placeholder substituted per sample.
pub async fn load_prompts(dir: impl AsRef<Path>, version: &str) -> Result<(String, String)> {
    let base = dir.as_ref().join(version);
    let system = read_prompt(&base.join("system.txt")).await?;
    let user = read_prompt(&base.join("user.txt")).await?;
    Ok((system, user))
}

async fn read_prompt(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read prompt file {}", path.display()))
}
