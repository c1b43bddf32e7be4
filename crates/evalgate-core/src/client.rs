use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Generation backend. The only blocking call in the whole pipeline, kept
/// behind a trait so the orchestrator never depends on a concrete backend.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Non-streaming client for a local Ollama server.
pub struct OllamaClient {
    model: String,
    temperature: f64,
    top_p: f64,
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(model: impl Into<String>, temperature: f64, top_p: f64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            model: model.into(),
            temperature,
            top_p,
            base_url: "http://localhost:11434/api/generate".to_string(),
            client,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "prompt": format!("{system_prompt}\n\n{user_prompt}"),
            "stream": false,
            "options": {
                "temperature": self.temperature,
                "top_p": self.top_p,
            },
        });

        let resp = self
            .client
            .post(&self.base_url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Generation request to {} failed", self.base_url))?;

        let status = resp.status();
        let body = resp
            .json::<Value>()
            .await
            .context("Generation backend returned a non-JSON body")?;
        if !status.is_success() {
            anyhow::bail!("HTTP {}: {}", status.as_u16(), body);
        }

        Ok(body
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}
