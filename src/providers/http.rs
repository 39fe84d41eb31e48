/*!
 * Inference-endpoint backend.
 *
 * Sends the whole batch in one POST request to an endpoint serving a
 * sequence-to-sequence normalization pipeline:
 *
 * ```text
 * POST {endpoint}
 * {"inputs": ["..", ".."], "parameters": {"beam_size": 5}}
 * ```
 *
 * The answer is a JSON array with one object per input exposing `text`
 * (or `generated_text`). Some servers wrap every item into its own array;
 * the first object of such a wrapper is used.
 */

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::errors::ProviderError;
use super::{build_client, NormalizationModel, NormalizedRecord};

/// Request body for the inference endpoint
#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    /// Sentences to normalize
    inputs: &'a [String],
    /// Generation parameters
    parameters: InferenceParameters,
}

/// Generation parameters forwarded to the pipeline
#[derive(Debug, Clone, Serialize)]
struct InferenceParameters {
    /// Beam width used by the decoder
    #[serde(skip_serializing_if = "Option::is_none")]
    beam_size: Option<u32>,
}

/// Client for an HTTP normalization endpoint
#[derive(Debug)]
pub struct HttpModel {
    /// Full URL of the endpoint
    endpoint: String,
    /// Model identifier reported to logs and cache
    model: String,
    /// Optional bearer token
    api_key: Option<String>,
    /// Beam width forwarded to the pipeline
    beam_size: Option<u32>,
    /// HTTP client for making requests
    client: Client,
}

impl HttpModel {
    /// Create a new client
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        beam_size: Option<u32>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.is_empty()),
            beam_size,
            client: build_client(Client::builder().timeout(Duration::from_secs(timeout_secs)), "endpoint"),
        }
    }
}

#[async_trait]
impl NormalizationModel for HttpModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn normalize_batch(&self, inputs: &[String]) -> Result<Vec<NormalizedRecord>, ProviderError> {
        let body = InferenceRequest {
            inputs,
            parameters: InferenceParameters { beam_size: self.beam_size },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        debug!("Sending {} sentences to {}", inputs.len(), self.endpoint);
        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ProviderError::ConnectionError(e.to_string())
            } else {
                ProviderError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            error!("Normalization endpoint error ({}): {}", status, response_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: response_text,
            });
        }

        let value: Value = serde_json::from_str(&response_text)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        parse_records(value)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let probe = vec!["Test.".to_string()];
        self.normalize_batch(&probe).await.map(|_| ())
    }
}

/// Interpret an endpoint answer as a list of records.
///
/// Items that are neither an object nor a wrapped object become records
/// without text, so the caller can substitute its error marker.
pub fn parse_records(value: Value) -> Result<Vec<NormalizedRecord>, ProviderError> {
    match value {
        Value::Array(items) => Ok(items.into_iter().map(record_from_item).collect()),
        Value::Object(map) => match map.get("error") {
            Some(message) => Err(ProviderError::ModelFailure(
                message.as_str().map(str::to_string).unwrap_or_else(|| message.to_string()),
            )),
            None => Err(ProviderError::ParseError(
                "expected a JSON array of results".to_string(),
            )),
        },
        other => Err(ProviderError::ParseError(format!(
            "expected a JSON array of results, got {}",
            other
        ))),
    }
}

fn record_from_item(item: Value) -> NormalizedRecord {
    match item {
        Value::Object(_) => serde_json::from_value(item).unwrap_or_default(),
        Value::Array(inner) => inner
            .into_iter()
            .next()
            .map(record_from_item)
            .unwrap_or_default(),
        _ => NormalizedRecord::missing(),
    }
}
