use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use super::{build_client, NormalizationModel, NormalizedRecord};

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    /// How long to keep the model loaded in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Random seed for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: Option<String>,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
            keep_alive: None,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature, with a fixed seed so reruns agree
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
            seed: Some(42),
        });
        self
    }

    /// Set the keep-alive duration
    pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }
}

/// Ollama-backed normalizer.
///
/// Ollama has no batch endpoint, so the sentences of a batch are sent one
/// after the other. Any failing sentence fails the whole batch.
#[derive(Debug)]
pub struct OllamaModel {
    /// Base URL of the Ollama API
    base_url: String,
    /// Model name
    model: String,
    /// System prompt guiding the normalization
    system_prompt: String,
    /// Sampling temperature
    temperature: f32,
    /// HTTP client for making requests
    client: Client,
}

impl OllamaModel {
    /// Create a new Ollama client from a complete URL
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        temperature: f32,
        timeout_secs: u64,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            temperature,
            client: build_client(
                Client::builder()
                    .timeout(Duration::from_secs(timeout_secs))
                    // Ollama uses HTTP/1.1
                    .http1_only()
                    .pool_idle_timeout(Duration::from_secs(90)),
                "Ollama",
            ),
        }
    }

    /// Generate text from the Ollama API
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self.client.post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to Ollama API: {}", e)))?;

        let status = response.status();
        let response_text = response.text().await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to get response text from Ollama API: {}", e)))?;

        if !status.is_success() {
            error!("Ollama API error ({}): {}", status, response_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: response_text,
            });
        }

        serde_json::from_str::<GenerationResponse>(&response_text).map_err(|e| {
            let preview: String = response_text.chars().take(500).collect();
            error!("Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}", e, preview);
            ProviderError::ParseError(e.to_string())
        })
    }

    fn build_request(&self, sentence: &str) -> GenerationRequest {
        GenerationRequest::new(self.model.clone(), sentence)
            .system(self.system_prompt.clone())
            .temperature(self.temperature)
            .keep_alive("5m")
    }
}

#[async_trait]
impl NormalizationModel for OllamaModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn normalize_batch(&self, inputs: &[String]) -> Result<Vec<NormalizedRecord>, ProviderError> {
        let mut records = Vec::with_capacity(inputs.len());
        for sentence in inputs {
            let response = self.generate(&self.build_request(sentence)).await?;
            let text = response
                .response
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());
            records.push(NormalizedRecord { text });
        }
        debug!("Ollama normalized {} sentences with {}", records.len(), self.model);
        Ok(records)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError {
                status_code: response.status().as_u16(),
                message: "Ollama server is not reachable".to_string(),
            })
        }
    }
}
