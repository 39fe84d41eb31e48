/*!
 * Error types for the origreg application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a normalization model backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The model backend rejected or failed on the batch
    #[error("Model error: {0}")]
    ModelFailure(String),
}

/// Errors that can occur while reading or writing TEI documents
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The XML could not be parsed
    #[error("XML parse error at byte {position}: {message}")]
    Parse {
        /// Byte offset reported by the reader
        position: u64,
        /// Parser message
        message: String,
    },

    /// The document has no root element
    #[error("Document has no root element")]
    MissingRoot,

    /// Start and end tags do not match
    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        /// Name of the open element
        expected: String,
        /// Name of the closing tag that was read
        found: String,
    },
}

/// Errors raised by configuration validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting has a value outside its domain
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the setting
        field: String,
        /// Why the value is rejected
        reason: String,
    },

    /// A regular expression setting does not compile
    #[error("Invalid pattern for {field}: {source}")]
    InvalidPattern {
        /// Dotted path of the setting
        field: String,
        /// Compilation error
        #[source]
        source: regex::Error,
    },
}

/// Errors that can occur during batch normalization
#[derive(Error, Debug)]
pub enum NormalizationError {
    /// The model failed on a whole batch; nothing of the batch was written
    #[error("Batch {batch_index} failed ({} inputs): {source}", .inputs.len())]
    BatchFailed {
        /// Zero-based index of the failing batch in the document
        batch_index: usize,
        /// Cleaned input texts of the failing batch
        inputs: Vec<String>,
        /// Underlying model error
        #[source]
        source: ProviderError,
    },
}
