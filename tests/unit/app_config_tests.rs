/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use origreg::app_config::{Config, LogLevel, ModelProvider};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common;

/// Test that a missing config file is created with default values
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&config_path)?;

    assert!(config_path.exists());
    assert_eq!(config, Config::default());
    let written: Config = serde_json::from_str(&fs::read_to_string(&config_path)?)?;
    assert_eq!(written, config);
    Ok(())
}

/// Test that an existing config file is read back as written
#[test]
fn test_load_or_create_withExistingFile_shouldReadIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.normalization.provider = ModelProvider::Ollama;
    config.normalization.batch_size = 16;
    config.normalization.fail_fast = true;
    config.paths.output_dir = Some("out".to_string());
    config.cache.enabled = true;
    config.log_level = LogLevel::Debug;
    config.save(&config_path)?;

    let loaded = Config::load_or_create(&config_path)?;

    assert_eq!(loaded, config);
    assert_eq!(loaded.paths.output_root(Path::new("in")), PathBuf::from("out"));
    assert_eq!(loaded.normalization.resolved_provider_config().model, "llama3.2:3b");
    assert_eq!(loaded.normalization.resolved_provider_config().endpoint, "http://localhost:11434");
    Ok(())
}

/// Test that a malformed config file is reported instead of replaced
#[test]
fn test_load_or_create_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&config_path).is_err());
    assert_eq!(fs::read_to_string(&config_path)?, "{ not json");
    Ok(())
}

#[test]
fn test_deserialize_withProviderList_shouldKeepTypeField() {
    let json = r#"{
        "normalization": {
            "provider": "http",
            "available_providers": [
                { "type": "http", "model": "local/normaliser", "endpoint": "http://127.0.0.1:9000/normalise", "beam_size": 3 }
            ]
        }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();

    let provider = config.normalization.get_active_provider_config().unwrap();
    assert_eq!(provider.model, "local/normaliser");
    assert_eq!(provider.beam_size, Some(3));
    assert_eq!(provider.timeout_secs, 120);
    assert!(config.normalization.get_provider_config(&ModelProvider::Ollama).is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_active_provider_config_mut_withMissingEntry_shouldCreateIt() {
    let mut config = Config::default();
    config.normalization.available_providers.clear();
    config.normalization.provider = ModelProvider::Ollama;

    config.normalization.active_provider_config_mut().model = "mistral".to_string();

    assert_eq!(config.normalization.available_providers.len(), 1);
    assert_eq!(config.normalization.resolved_provider_config().model, "mistral");
}

#[test]
fn test_normalizer_options_shouldMirrorSettings() {
    let mut config = Config::default();
    config.normalization.batch_size = 3;
    config.normalization.error_marker = "[?]".to_string();
    config.normalization.debug_samples = false;

    let options = config.normalization.normalizer_options();

    assert_eq!(options.batch_size, 3);
    assert_eq!(options.error_marker, "[?]");
    assert!(!options.debug_samples);
}

#[test]
fn test_validate_withInvalidSettings_shouldFail() {
    let cases: Vec<(&str, fn(&mut Config))> = vec![
        ("empty input dir", |c| c.paths.input_dir = "  ".to_string()),
        ("empty results dir", |c| c.paths.results_dir = String::new()),
        ("empty suffix", |c| c.paths.output_suffix = String::new()),
        ("empty boundaries", |c| c.segmentation.boundary_chars = String::new()),
        ("unanchored strip pattern", |c| c.normalization.strip_pattern = "[-]+".to_string()),
        ("zero batch size", |c| c.normalization.batch_size = 0),
        ("sample rate above one", |c| c.normalization.debug_sample_rate = 2.0),
        ("zero timeout", |c| c.normalization.active_provider_config_mut().timeout_secs = 0),
    ];

    for (name, mutate) in cases {
        let mut config = Config::default();
        mutate(&mut config);
        assert!(config.validate().is_err(), "case should fail: {}", name);
    }
}

#[test]
fn test_default_shouldDisableCacheAndEnableSamples() {
    let config = Config::default();
    assert!(!config.cache.enabled);
    assert!(config.cache.path.is_none());
    assert!(config.normalization.debug_samples);
    assert!(!config.normalization.fail_fast);
    assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Info);
}
