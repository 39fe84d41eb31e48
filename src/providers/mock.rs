/*!
 * Mock model implementations for testing.
 *
 * This module provides a mock model that simulates different behaviors:
 * - `MockModel::working()` - Always succeeds, upper-casing every sentence
 * - `MockModel::missing_text(i)` - Omits the text field of item `i`
 * - `MockModel::failing()` - Always fails with an error
 * - `MockModel::failing_on_call(n)` - Fails only on the n-th call (0-based)
 *
 * Every call is recorded so tests can inspect what was sent.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use super::{NormalizationModel, NormalizedRecord};

/// Behavior mode for the mock model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Succeeds but leaves out the text of one item of every batch
    MissingText { index: usize },
    /// Returns fewer records than inputs
    Truncated { keep: usize },
    /// Always fails with an error
    Failing,
    /// Fails on one call only
    FailingOnCall { call: usize },
}

/// Mock model for testing normalization behavior
#[derive(Debug, Clone)]
pub struct MockModel {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter
    call_count: Arc<AtomicUsize>,
    /// Inputs of every call, in call order
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    /// Custom normalization function (optional)
    transform: Option<fn(&str) -> String>,
}

impl MockModel {
    /// Create a new mock model with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            transform: None,
        }
    }

    /// Create a working mock model
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that omits the text of item `index` in each batch
    pub fn missing_text(index: usize) -> Self {
        Self::new(MockBehavior::MissingText { index })
    }

    /// Create a mock that answers with only `keep` records
    pub fn truncated(keep: usize) -> Self {
        Self::new(MockBehavior::Truncated { keep })
    }

    /// Create a failing mock model
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock failing on the given call only
    pub fn failing_on_call(call: usize) -> Self {
        Self::new(MockBehavior::FailingOnCall { call })
    }

    /// Set a custom normalization function
    pub fn with_transform(mut self, transform: fn(&str) -> String) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Inputs of every call received so far
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    fn normalize(&self, input: &str) -> String {
        match self.transform {
            Some(transform) => transform(input),
            None => input.to_uppercase(),
        }
    }
}

#[async_trait]
impl NormalizationModel for MockModel {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn normalize_batch(&self, inputs: &[String]) -> Result<Vec<NormalizedRecord>, ProviderError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(inputs.to_vec());

        let records = inputs.iter().map(|input| NormalizedRecord::with_text(self.normalize(input)));

        match self.behavior {
            MockBehavior::Working => Ok(records.collect()),
            MockBehavior::MissingText { index } => Ok(records
                .enumerate()
                .map(|(i, record)| if i == index { NormalizedRecord::missing() } else { record })
                .collect()),
            MockBehavior::Truncated { keep } => Ok(records.take(keep).collect()),
            MockBehavior::Failing => Err(ProviderError::ModelFailure("simulated model failure".to_string())),
            MockBehavior::FailingOnCall { call: failing_call } => {
                if call == failing_call {
                    Err(ProviderError::ModelFailure(format!("simulated failure on call {}", call)))
                } else {
                    Ok(records.collect())
                }
            }
        }
    }
}
