/*!
 * Normalization model backends.
 *
 * This module contains client implementations for the models that turn
 * historical spelling into modern spelling:
 * - `http`: inference endpoint serving a sequence-to-sequence normalizer
 * - `ollama`: local LLM prompted to normalize each sentence
 * - `cached`: persistent cache decorator around any other backend
 * - `mock`: deterministic model for tests
 */

use async_trait::async_trait;
use log::warn;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::ProviderError;

pub mod cached;
pub mod http;
pub mod mock;
pub mod ollama;

/// One result of a batch call
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Normalized text, absent when the model produced nothing for the item
    #[serde(default, alias = "generated_text")]
    pub text: Option<String>,
}

impl NormalizedRecord {
    /// Record carrying a normalized text
    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()) }
    }

    /// Record without a text field
    pub fn missing() -> Self {
        Self { text: None }
    }
}

/// Common trait for all normalization models
///
/// A model receives an ordered list of cleaned sentences and returns one
/// record per sentence, in the same order. Implementations may cache
/// internally, callers must not rely on it.
#[async_trait]
pub trait NormalizationModel: Send + Sync + Debug {
    /// Identifier of the underlying model, used in logs and cache keys
    fn model_name(&self) -> &str;

    /// Normalize a batch of sentences
    ///
    /// # Arguments
    /// * `inputs` - Cleaned sentences, at most one batch long
    ///
    /// # Returns
    /// * `Result<Vec<NormalizedRecord>, ProviderError>` - One record per input or an error for the whole batch
    async fn normalize_batch(&self, inputs: &[String]) -> Result<Vec<NormalizedRecord>, ProviderError>;

    /// Test the connection to the backend
    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[async_trait]
impl<M: NormalizationModel + ?Sized> NormalizationModel for Arc<M> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    async fn normalize_batch(&self, inputs: &[String]) -> Result<Vec<NormalizedRecord>, ProviderError> {
        (**self).normalize_batch(inputs).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        (**self).test_connection().await
    }
}

#[async_trait]
impl<M: NormalizationModel + ?Sized> NormalizationModel for Box<M> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    async fn normalize_batch(&self, inputs: &[String]) -> Result<Vec<NormalizedRecord>, ProviderError> {
        (**self).normalize_batch(inputs).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        (**self).test_connection().await
    }
}

/// Build an HTTP client, falling back to reqwest's defaults (no timeout)
/// when the configured builder is rejected
pub(crate) fn build_client(builder: ClientBuilder, backend: &str) -> Client {
    match builder.build() {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to build {} HTTP client, using default settings: {}", backend, e);
            Client::new()
        }
    }
}
