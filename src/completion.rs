//! Text completion via the Ollama HTTP API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};

/// Prompt-to-text capability consumed by the resolver and composer.
///
/// Implementations give no guarantee that the output follows the prompt's
/// format instructions; callers must parse defensively.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama `/api/generate` client
pub struct OllamaClient {
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client from config; every request carries the configured timeout
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::completion(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.completion_base_url.trim_end_matches('/').to_string(),
            model: config.completion_model.clone(),
            http_client,
        })
    }

    /// Model name this client generates with
    pub fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionModel for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::completion(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::completion(format!(
                "Ollama API error {}: {}",
                status, body_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::completion(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(generated.response)
    }
}
