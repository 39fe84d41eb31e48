/*!
 * Database module for the persistent normalization cache.
 *
 * This module provides SQLite-based persistence of model answers so that
 * reruns over the same corpus skip sentences already normalized.
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{CacheRecord, CacheStats};
pub use repository::CacheRepository;
