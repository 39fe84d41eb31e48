/*!
 * Database models for the normalization cache.
 *
 * These structures map directly to database tables.
 */

use serde::{Deserialize, Serialize};

/// One cached normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Database ID
    pub id: i64,
    /// SHA256 hash of the input sentence
    pub input_hash: String,
    /// Cleaned input sentence
    pub input_text: String,
    /// Text returned by the model
    pub normalized_text: String,
    /// Model that produced the text
    pub model: String,
    /// Creation timestamp
    pub created_at: String,
    /// Number of cache hits
    pub hit_count: i64,
}

impl CacheRecord {
    /// Create a new cache record, hashing the input
    pub fn new(input_text: impl Into<String>, normalized_text: impl Into<String>, model: impl Into<String>) -> Self {
        let input_text = input_text.into();
        Self {
            id: 0, // Will be assigned by database
            input_hash: super::repository::CacheRepository::hash_text(&input_text),
            input_text,
            normalized_text: normalized_text.into(),
            model: model.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
            hit_count: 0,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of cache entries
    pub total_entries: i64,
    /// Total number of cache hits
    pub total_hits: i64,
}
