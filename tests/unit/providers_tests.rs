/*!
 * Tests for normalization model backends
 */

use anyhow::Result;
use serde_json::json;

use origreg::database::{CacheRepository, DatabaseConnection};
use origreg::errors::ProviderError;
use origreg::providers::cached::CachedModel;
use origreg::providers::http::{parse_records, HttpModel};
use origreg::providers::mock::MockModel;
use origreg::providers::ollama::GenerationRequest;
use origreg::providers::{NormalizationModel, NormalizedRecord};

use crate::common;

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_mock_working_shouldUppercaseAndRecordCalls() {
    let model = MockModel::working();

    let records = model.normalize_batch(&texts(&["vray", "ouy"])).await.unwrap();

    assert_eq!(records, vec![NormalizedRecord::with_text("VRAY"), NormalizedRecord::with_text("OUY")]);
    assert_eq!(model.call_count(), 1);
    assert_eq!(model.calls(), vec![texts(&["vray", "ouy"])]);
}

#[tokio::test]
async fn test_mock_failingOnCall_shouldFailOnlyThatCall() {
    let model = MockModel::failing_on_call(1);

    assert!(model.normalize_batch(&texts(&["a"])).await.is_ok());
    assert!(model.normalize_batch(&texts(&["b"])).await.is_err());
    assert!(model.normalize_batch(&texts(&["c"])).await.is_ok());
    assert_eq!(model.call_count(), 3);
}

#[tokio::test]
async fn test_mock_withTransform_shouldApplyIt() {
    let model = MockModel::working().with_transform(|s| s.replace("vray", "vrai"));
    let records = model.normalize_batch(&texts(&["il est vray"])).await.unwrap();
    assert_eq!(records[0].text.as_deref(), Some("il est vrai"));
}

#[test]
fn test_parse_records_withScalarItems_shouldYieldMissingRecords() {
    let records = parse_records(json!([{"text": "a"}, "b", null])).unwrap();
    assert_eq!(
        records,
        vec![NormalizedRecord::with_text("a"), NormalizedRecord::missing(), NormalizedRecord::missing()]
    );
}

#[test]
fn test_parse_records_withUnexpectedShape_shouldReportParseError() {
    assert!(matches!(parse_records(json!("text")), Err(ProviderError::ParseError(_))));
    assert!(matches!(parse_records(json!({"results": []})), Err(ProviderError::ParseError(_))));
}

#[test]
fn test_normalized_record_shouldDeserializeGeneratedText() {
    let record: NormalizedRecord = serde_json::from_value(json!({"generated_text": "Oui."})).unwrap();
    assert_eq!(record, NormalizedRecord::with_text("Oui."));
}

#[tokio::test]
async fn test_http_model_withUnreachableEndpoint_shouldFail() {
    let model = HttpModel::new("http://127.0.0.1:9/normalise", "local", None, Some(5), 2);

    let result = model.normalize_batch(&texts(&["Test."])).await;

    assert!(matches!(
        result,
        Err(ProviderError::ConnectionError(_)) | Err(ProviderError::RequestFailed(_))
    ));
    assert_eq!(model.model_name(), "local");
}

#[test]
fn test_generation_request_shouldSerializeNonStreaming() {
    let request = GenerationRequest::new("llama3.2:3b", "Il est vray.")
        .system("Normalize")
        .temperature(0.0)
        .keep_alive("5m");

    let value = serde_json::to_value(&request).unwrap();

    assert_eq!(value["model"], "llama3.2:3b");
    assert_eq!(value["prompt"], "Il est vray.");
    assert_eq!(value["system"], "Normalize");
    assert_eq!(value["stream"], false);
    assert_eq!(value["keep_alive"], "5m");
    assert_eq!(value["options"]["seed"], 42);
}

/// Test that answers persisted in a database file are reused by a new run
#[tokio::test]
async fn test_cached_model_withFileRepository_shouldReuseAnswersAcrossRuns() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("cache/normalization_cache.db");

    let first_inner = MockModel::working();
    let first = CachedModel::new(first_inner.clone())
        .with_repository(CacheRepository::new(DatabaseConnection::open(&db_path)?));
    first.normalize_batch(&texts(&["vray", "ouy"])).await?;
    assert_eq!(first_inner.call_count(), 1);

    let second_inner = MockModel::working();
    let second = CachedModel::new(second_inner.clone())
        .with_repository(CacheRepository::new(DatabaseConnection::open(&db_path)?));
    let records = second.normalize_batch(&texts(&["ouy", "non", "vray"])).await?;

    assert_eq!(
        records,
        vec![
            NormalizedRecord::with_text("OUY"),
            NormalizedRecord::with_text("NON"),
            NormalizedRecord::with_text("VRAY"),
        ]
    );
    assert_eq!(second_inner.calls(), vec![texts(&["non"])]);
    assert_eq!(second.stats(), (2, 1));

    let stats = CacheRepository::new(DatabaseConnection::open(&db_path)?).stats().await?;
    assert_eq!(stats.total_entries, 3);
    Ok(())
}

#[tokio::test]
async fn test_cached_model_withShortAnswer_shouldPadWithMissing() {
    let model = CachedModel::new(MockModel::truncated(1));

    let records = model.normalize_batch(&texts(&["a", "b"])).await.unwrap();

    assert_eq!(records, vec![NormalizedRecord::with_text("A"), NormalizedRecord::missing()]);
    assert_eq!(model.inner().call_count(), 1);
}
