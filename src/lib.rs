/*!
 * # origreg - sentence segmentation and spelling normalization for TEI
 *
 * A Rust library that prepares TEI-encoded historical texts for
 * normalization and runs the normalization model over them.
 *
 * ## Features
 *
 * - Punctuation-based sentence segmentation of `<p>` and `<ab>` units
 * - Numbered `<seg n="k" xml:id="sk">` elements replacing the unit content
 * - `<orig>`/`<reg>` duplication keeping both spellings addressable
 * - Batched normalization through pluggable models:
 *   - HTTP inference endpoint (seq2seq normalizer)
 *   - Ollama (local LLM)
 * - Optional SQLite cache of model answers
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `tei`: XML document model, structural cleanup and duplication
 * - `segmentation`: Segmenter and segment materializer
 * - `normalization`: Text cleaning and batched model calls
 * - `providers`: Normalization model backends:
 *   - `providers::http`: Inference endpoint client
 *   - `providers::ollama`: Ollama API client
 *   - `providers::cached`: Caching decorator
 *   - `providers::mock`: Deterministic model for tests
 * - `database`: SQLite persistence of the normalization cache
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod normalization;
pub mod providers;
pub mod segmentation;
pub mod tei;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunSummary};
pub use errors::{ConfigError, DocumentError, NormalizationError, ProviderError};
pub use normalization::{BatchNormalizer, BatchProgress, TextCleaner};
pub use providers::{NormalizationModel, NormalizedRecord};
pub use segmentation::{segment_document, Segmenter};
pub use tei::{Document, Element, Node};
