/*!
 * Repository layer for the normalization cache.
 *
 * Entries are keyed by the SHA256 of the cleaned input and by the model
 * name, so two models never share results.
 */

use anyhow::Result;
use log::debug;
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use super::connection::DatabaseConnection;
use super::models::{CacheRecord, CacheStats};

/// Repository for cache operations
#[derive(Debug, Clone)]
pub struct CacheRepository {
    /// Database connection
    db: DatabaseConnection,
}

impl CacheRepository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::open_in_memory()?;
        Ok(Self::new(db))
    }

    /// Compute SHA256 hash of text
    pub fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up several inputs at once, returning the hits by input text
    pub async fn get_many(&self, inputs: &[String], model: &str) -> Result<HashMap<String, String>> {
        let inputs = inputs.to_vec();
        let model = model.to_string();

        self.db
            .with_transaction(move |tx| {
                let mut hits = HashMap::new();
                for input in inputs {
                    if hits.contains_key(&input) {
                        continue;
                    }
                    let input_hash = Self::hash_text(&input);
                    let result: Option<(i64, String)> = tx
                        .query_row(
                            "SELECT id, normalized_text FROM normalization_cache WHERE input_hash = ?1 AND model = ?2",
                            params![input_hash, model],
                            |row| Ok((row.get(0)?, row.get(1)?)),
                        )
                        .optional()?;
                    if let Some((id, normalized_text)) = result {
                        tx.execute(
                            "UPDATE normalization_cache SET hit_count = hit_count + 1 WHERE id = ?1",
                            [id],
                        )?;
                        hits.insert(input, normalized_text);
                    }
                }
                debug!("Cache lookup: {} hits", hits.len());
                Ok(hits)
            })
            .await
    }

    /// Store several normalizations in one transaction
    pub async fn store_many(&self, records: Vec<CacheRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.db
            .with_transaction(move |tx| {
                for record in &records {
                    tx.execute(
                        r#"
                        INSERT INTO normalization_cache (
                            input_hash, input_text, normalized_text, model, created_at, hit_count
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                        ON CONFLICT(input_hash, model)
                        DO UPDATE SET normalized_text = excluded.normalized_text
                        "#,
                        params![
                            record.input_hash,
                            record.input_text,
                            record.normalized_text,
                            record.model,
                            record.created_at,
                            record.hit_count,
                        ],
                    )?;
                }
                Ok(())
            })
            .await
    }

    /// Get cache statistics
    pub async fn stats(&self) -> Result<CacheStats> {
        self.db
            .with_connection(|conn| {
                let total_entries: i64 = conn
                    .query_row("SELECT COUNT(*) FROM normalization_cache", [], |row| row.get(0))
                    .unwrap_or(0);

                let total_hits: i64 = conn
                    .query_row(
                        "SELECT COALESCE(SUM(hit_count), 0) FROM normalization_cache",
                        [],
                        |row| row.get(0),
                    )
                    .unwrap_or(0);

                Ok(CacheStats {
                    total_entries,
                    total_hits,
                })
            })
            .await
    }
}
