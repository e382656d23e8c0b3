//! Streaming client for an Ollama-style `/api/generate` endpoint.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::GenerationError;
use crate::models::config::LlmConfig;

use super::prompt::ExtractionPrompt;
use super::stream::consume_stream;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Sends prompts to the generation endpoint and collects the streamed reply.
#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl GenerationClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for the bill fields in `text`; returns its raw reply.
    pub async fn extract(&self, text: &str) -> Result<String, GenerationError> {
        let prompt = ExtractionPrompt::new(text);
        self.generate(prompt.as_str()).await
    }

    /// Submit a prompt and concatenate every streamed fragment.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let start = Instant::now();

        let output = tokio::time::timeout(self.timeout, self.generate_inner(prompt))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout.as_secs()))??;

        info!(
            "Generation with {} returned {} chars in {:?}",
            self.model,
            output.len(),
            start.elapsed()
        );
        Ok(output)
    }

    async fn generate_inner(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
        };

        debug!(model = %self.model, endpoint = %self.endpoint, "Sending generate request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        consume_stream(response.bytes_stream()).await
    }
}
