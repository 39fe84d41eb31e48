/*!
 * Tests for error types and conversions
 */

use std::error::Error;

use origreg::errors::{ConfigError, DocumentError, NormalizationError, ProviderError};

#[test]
fn test_provider_error_display_shouldIncludeDetails() {
    let error = ProviderError::ApiError {
        status_code: 503,
        message: "model loading".to_string(),
    };
    assert_eq!(error.to_string(), "API responded with error: 503 - model loading");
    assert_eq!(
        ProviderError::ConnectionError("refused".to_string()).to_string(),
        "Connection error: refused"
    );
}

#[test]
fn test_batch_failed_display_shouldCountInputsAndKeepSource() {
    let error = NormalizationError::BatchFailed {
        batch_index: 1,
        inputs: vec!["Il est vray.".to_string(), "Non.".to_string()],
        source: ProviderError::ModelFailure("timeout".to_string()),
    };

    assert_eq!(error.to_string(), "Batch 1 failed (2 inputs): Model error: timeout");
    let source = error.source().expect("source error");
    assert_eq!(source.to_string(), "Model error: timeout");
}

#[test]
fn test_document_error_display_shouldNamePosition() {
    let error = DocumentError::Parse {
        position: 42,
        message: "unexpected end".to_string(),
    };
    assert_eq!(error.to_string(), "XML parse error at byte 42: unexpected end");
    assert_eq!(
        DocumentError::MismatchedTag {
            expected: "p".to_string(),
            found: "ab".to_string()
        }
        .to_string(),
        "Mismatched end tag: expected </p>, found </ab>"
    );
}

#[test]
fn test_config_error_display_shouldNameField() {
    let error = ConfigError::InvalidValue {
        field: "normalization.batch_size".to_string(),
        reason: "must be greater than 0".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Invalid value for normalization.batch_size: must be greater than 0"
    );
}
