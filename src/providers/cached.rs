/*!
 * Caching decorator for normalization models.
 *
 * Sentences already normalized by the same model are answered from an
 * in-memory map and, when a repository is attached, from the SQLite cache.
 * Only the misses reach the wrapped model, in their original order.
 * Items the model left without text are never cached.
 */

use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::database::{CacheRecord, CacheRepository, CacheStats};
use crate::errors::ProviderError;
use super::{NormalizationModel, NormalizedRecord};

/// Default number of answers kept in memory. The map is reset when full,
/// the repository keeps everything.
pub const DEFAULT_MEMORY_CAPACITY: usize = 50_000;

/// Model wrapper answering repeated sentences from a cache
#[derive(Debug)]
pub struct CachedModel<M> {
    /// Wrapped model
    inner: M,
    /// Answers seen during this run, at most `memory_capacity` of them
    memory: Arc<RwLock<HashMap<String, String>>>,
    memory_capacity: usize,
    /// Persistent store, if any
    repository: Option<CacheRepository>,
    /// Cache hit counter
    hits: AtomicUsize,
    /// Cache miss counter
    misses: AtomicUsize,
}

impl<M: NormalizationModel> CachedModel<M> {
    /// Wrap a model with an in-memory cache only
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            memory: Arc::new(RwLock::new(HashMap::new())),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            repository: None,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Attach a persistent repository
    pub fn with_repository(mut self, repository: CacheRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Limit the number of answers kept in memory
    pub fn with_memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = capacity;
        self
    }

    /// Wrapped model
    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// (hits, misses) so far
    pub fn stats(&self) -> (usize, usize) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }

    /// Number of answers currently held in memory
    pub fn memory_len(&self) -> usize {
        self.memory.read().len()
    }

    /// Totals of the attached repository, `None` without one or when it cannot be read
    pub async fn stored_stats(&self) -> Option<CacheStats> {
        match self.repository.as_ref()?.stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("Cannot read the normalization cache: {}", e);
                None
            }
        }
    }

    fn memorize(&self, pairs: &[(String, String)]) {
        let mut memory = self.memory.write();
        if memory.len() + pairs.len() > self.memory_capacity {
            debug!("In-memory cache full ({} answers), starting over", memory.len());
            memory.clear();
        }
        memory.extend(pairs.iter().take(self.memory_capacity).cloned());
    }

    async fn lookup(&self, inputs: &[String]) -> HashMap<String, String> {
        let mut found: HashMap<String, String> = {
            let memory = self.memory.read();
            inputs
                .iter()
                .filter_map(|input| memory.get(input).map(|text| (input.clone(), text.clone())))
                .collect()
        };

        let Some(repository) = &self.repository else {
            return found;
        };

        let remaining: Vec<String> = inputs.iter().filter(|input| !found.contains_key(*input)).cloned().collect();
        if remaining.is_empty() {
            return found;
        }

        match repository.get_many(&remaining, self.inner.model_name()).await {
            Ok(stored) => {
                let pairs: Vec<(String, String)> = stored.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                self.memorize(&pairs);
                found.extend(stored);
            }
            Err(e) => warn!("Cache lookup failed, asking the model instead: {}", e),
        }
        found
    }

    async fn remember(&self, pairs: Vec<(String, String)>) {
        if pairs.is_empty() {
            return;
        }
        self.memorize(&pairs);

        if let Some(repository) = &self.repository {
            let model = self.inner.model_name();
            let records = pairs
                .into_iter()
                .map(|(input, text)| CacheRecord::new(input, text, model))
                .collect();
            if let Err(e) = repository.store_many(records).await {
                warn!("Failed to persist normalizations: {}", e);
            }
        }
    }
}

#[async_trait]
impl<M: NormalizationModel> NormalizationModel for CachedModel<M> {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn normalize_batch(&self, inputs: &[String]) -> Result<Vec<NormalizedRecord>, ProviderError> {
        let found = self.lookup(inputs).await;

        let misses: Vec<String> = inputs.iter().filter(|input| !found.contains_key(*input)).cloned().collect();
        self.hits.fetch_add(inputs.len() - misses.len(), Ordering::Relaxed);
        self.misses.fetch_add(misses.len(), Ordering::Relaxed);

        let mut answered = if misses.is_empty() {
            debug!("Batch of {} answered from cache", inputs.len());
            Vec::new()
        } else {
            self.inner.normalize_batch(&misses).await?
        };
        // Keep positions aligned for the caller even if the model answered short
        answered.resize(misses.len().max(answered.len()), NormalizedRecord::missing());

        let fresh: Vec<(String, String)> = misses
            .iter()
            .zip(&answered)
            .filter_map(|(input, record)| record.text.as_ref().map(|text| (input.clone(), text.clone())))
            .collect();

        let mut answered = answered.into_iter();
        let records = inputs
            .iter()
            .map(|input| match found.get(input) {
                Some(text) => NormalizedRecord::with_text(text.clone()),
                None => answered.next().unwrap_or_default(),
            })
            .collect();

        self.remember(fresh).await;
        Ok(records)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        if let Some(stats) = self.stored_stats().await {
            info!(
                "Normalization cache: {} stored answers, {} hits so far",
                stats.total_entries, stats.total_hits
            );
        }
        self.inner.test_connection().await
    }
}
