use anyhow::{anyhow, Context, Result};
use log::{info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use url::Url;

use crate::errors::ConfigError;
use crate::normalization::{
    NormalizerOptions, TextCleaner, DEFAULT_BATCH_SIZE, DEFAULT_ERROR_MARKER, DEFAULT_SAMPLE_RATE,
    DEFAULT_STRIP_PATTERN,
};
use crate::segmentation::segmenter::{Segmenter, DEFAULT_BOUNDARIES};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Input, output and results locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Sentence segmentation settings
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Normalization model and batching settings
    #[serde(default)]
    pub normalization: NormalizationConfig,

    /// Persistent normalization cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Normalization model provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    // @provider: Inference endpoint serving a seq2seq normalizer
    #[default]
    Http,
    // @provider: Ollama
    Ollama,
}

impl ModelProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Http => "HTTP endpoint",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Http => "http".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }
}

// Implement Display trait for ModelProvider
impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for ModelProvider
impl std::str::FromStr for ModelProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Beam width forwarded to seq2seq endpoints
    #[serde(default)]
    pub beam_size: Option<u32>,

    // @field: Instruction for prompt-driven models
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    // @field: Sampling temperature for prompt-driven models
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: ModelProvider) -> Self {
        match provider_type {
            ModelProvider::Http => Self {
                provider_type: "http".to_string(),
                model: default_http_model(),
                api_key: String::new(),
                endpoint: default_http_endpoint(),
                timeout_secs: default_timeout_secs(),
                beam_size: default_beam_size(),
                system_prompt: default_system_prompt(),
                temperature: default_temperature(),
            },
            ModelProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: default_ollama_model(),
                api_key: String::new(),
                endpoint: default_ollama_endpoint(),
                timeout_secs: default_timeout_secs(),
                beam_size: None,
                system_prompt: default_system_prompt(),
                temperature: default_temperature(),
            },
        }
    }
}

/// Input/output locations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PathsConfig {
    /// Root folder searched recursively for TEI files
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Root folder receiving the segmented files, the input root when unset
    #[serde(default)]
    pub output_dir: Option<String>,

    /// Folder the produced files are moved into at the end of the run
    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    /// Suffix appended to the stem of every produced file
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: None,
            results_dir: default_results_dir(),
            output_suffix: default_output_suffix(),
        }
    }
}

impl PathsConfig {
    /// Root folder for produced files: `output_dir`, or the input root of the run
    pub fn output_root(&self, input_root: &Path) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| input_root.to_path_buf())
    }
}

/// Sentence segmentation settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SegmentationConfig {
    /// Characters closing a segment
    #[serde(default = "default_boundary_chars")]
    pub boundary_chars: String,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            boundary_chars: default_boundary_chars(),
        }
    }
}

/// Normalization settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NormalizationConfig {
    /// Model provider to use
    #[serde(default)]
    pub provider: ModelProvider,

    /// Available model providers
    #[serde(default = "default_available_providers")]
    pub available_providers: Vec<ProviderConfig>,

    /// Candidates per model call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Anchored pattern removed from the start of every text
    #[serde(default = "default_strip_pattern")]
    pub strip_pattern: String,

    /// Whether sampled input/output pairs are shown during the run
    #[serde(default = "default_true")]
    pub debug_samples: bool,

    /// Probability of sampling each item
    #[serde(default = "default_debug_sample_rate")]
    pub debug_sample_rate: f64,

    /// Text written when the model returns nothing for an item
    #[serde(default = "default_error_marker")]
    pub error_marker: String,

    /// Stop the run at the first failing document
    #[serde(default)]
    pub fail_fast: bool,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            available_providers: default_available_providers(),
            batch_size: default_batch_size(),
            strip_pattern: default_strip_pattern(),
            debug_samples: true,
            debug_sample_rate: default_debug_sample_rate(),
            error_marker: default_error_marker(),
            fail_fast: false,
        }
    }
}

impl NormalizationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &ModelProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the active provider configuration, creating it with defaults if absent
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(index) => &mut self.available_providers[index],
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                let last = self.available_providers.len() - 1;
                &mut self.available_providers[last]
            }
        }
    }

    /// Get the active provider configuration, or the provider defaults
    pub fn resolved_provider_config(&self) -> ProviderConfig {
        let defaults = ProviderConfig::new(self.provider);
        match self.get_active_provider_config() {
            Some(config) => ProviderConfig {
                model: non_empty_or(&config.model, &defaults.model),
                endpoint: non_empty_or(&config.endpoint, &defaults.endpoint),
                ..config.clone()
            },
            None => defaults,
        }
    }

    /// Options of the batch normalizer
    pub fn normalizer_options(&self) -> NormalizerOptions {
        NormalizerOptions {
            batch_size: self.batch_size,
            error_marker: self.error_marker.clone(),
            debug_samples: self.debug_samples,
            debug_sample_rate: self.debug_sample_rate,
        }
    }
}

/// Persistent cache settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct CacheConfig {
    /// Whether model answers are cached across runs
    #[serde(default)]
    pub enabled: bool,

    /// Database file, the user data directory when unset
    #[serde(default)]
    pub path: Option<String>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() { fallback.to_string() } else { value.to_string() }
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_beam_size() -> Option<u32> {
    Some(5)
}

fn default_temperature() -> f32 {
    0.1
}

fn default_true() -> bool {
    true
}

fn default_input_dir() -> String {
    "in_XML".to_string()
}

fn default_results_dir() -> String {
    "origReg".to_string()
}

fn default_output_suffix() -> String {
    "_segmented".to_string()
}

fn default_boundary_chars() -> String {
    DEFAULT_BOUNDARIES.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_strip_pattern() -> String {
    DEFAULT_STRIP_PATTERN.to_string()
}

fn default_debug_sample_rate() -> f64 {
    DEFAULT_SAMPLE_RATE
}

fn default_error_marker() -> String {
    DEFAULT_ERROR_MARKER.to_string()
}

fn default_http_endpoint() -> String {
    "http://localhost:8080/normalise".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_http_model() -> String {
    "rbawden/modern_french_normalisation".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_system_prompt() -> String {
    "You normalize early modern French into contemporary French spelling. Keep the words, their order and the punctuation. Answer with the normalized sentence only.".to_string()
}

fn default_available_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(ModelProvider::Http),
        ProviderConfig::new(ModelProvider::Ollama),
    ]
}

impl Config {
    /// Load the configuration file, writing a default one when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.paths.input_dir.trim().is_empty() {
            return Err(invalid("paths.input_dir", "must not be empty").into());
        }
        if self.paths.results_dir.trim().is_empty() {
            return Err(invalid("paths.results_dir", "must not be empty").into());
        }
        if self.paths.output_suffix.is_empty() {
            return Err(invalid("paths.output_suffix", "must not be empty").into());
        }

        self.segmenter()?;
        self.cleaner()?;

        let normalization = &self.normalization;
        if normalization.batch_size == 0 {
            return Err(invalid("normalization.batch_size", "must be greater than 0").into());
        }
        if !(0.0..=1.0).contains(&normalization.debug_sample_rate) {
            return Err(invalid(
                "normalization.debug_sample_rate",
                &format!("{} is not between 0 and 1", normalization.debug_sample_rate),
            )
            .into());
        }

        let provider = normalization.resolved_provider_config();
        if provider.model.trim().is_empty() {
            return Err(invalid("normalization.model", "must not be empty").into());
        }
        Url::parse(&provider.endpoint).map_err(|e| {
            invalid("normalization.endpoint", &format!("'{}' is not a URL: {}", provider.endpoint, e))
        })?;
        if provider.timeout_secs == 0 {
            return Err(invalid("normalization.timeout_secs", "must be greater than 0").into());
        }

        Ok(())
    }

    /// Segmenter for the configured boundary set
    pub fn segmenter(&self) -> Result<Segmenter, ConfigError> {
        Segmenter::new(&self.segmentation.boundary_chars)
    }

    /// Cleaner for the configured strip pattern
    pub fn cleaner(&self) -> Result<TextCleaner, ConfigError> {
        TextCleaner::new(&self.normalization.strip_pattern)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
