use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::{Config, ModelProvider};
use crate::database::{CacheRepository, DatabaseConnection};
use crate::errors::DocumentError;
use crate::file_utils::FileManager;
use crate::normalization::{BatchNormalizer, BatchProgress, NormalizationStats};
use crate::providers::cached::CachedModel;
use crate::providers::http::HttpModel;
use crate::providers::ollama::OllamaModel;
use crate::providers::NormalizationModel;
use crate::segmentation::{segment_document, SegmentationStats, Segmenter};
use crate::tei::{clean_document, duplicate_segments, segment_parts_mut, Document, CANDIDATE};

// @module: Application controller for TEI segmentation and normalization

/// Name of the issues log written next to the inputs
pub const ISSUES_LOG_FILENAME: &str = "origreg.issues.log";

/// Result of processing one document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// The segmented document was written
    Written {
        /// Path of the produced file
        output: PathBuf,
        /// Segmentation counters
        segmentation: SegmentationStats,
        /// Normalization counters
        normalization: NormalizationStats,
    },
    /// An output already existed and overwriting was not requested
    Skipped {
        /// Path of the existing output
        output: PathBuf,
    },
}

/// Counters of a whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Documents written
    pub processed: usize,
    /// Documents skipped because their output existed
    pub skipped: usize,
    /// Documents that failed
    pub failed: usize,
    /// Segments created over all written documents
    pub segments: usize,
    /// Items replaced by the error marker
    pub missing_results: usize,
    /// Final location of every produced file
    pub outputs: Vec<PathBuf>,
    /// Failing inputs with their error
    pub failures: Vec<(PathBuf, String)>,
    /// Wall-clock duration
    pub duration: Duration,
}

impl RunSummary {
    /// Whether any document or relocation failed
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || !self.failures.is_empty()
    }

    /// One-line description of the run
    pub fn describe(&self) -> String {
        format!(
            "{} processed, {} skipped, {} failed, {} segments, {} missing results in {}",
            self.processed,
            self.skipped,
            self.failed,
            self.segments,
            self.missing_results,
            format_duration(self.duration)
        )
    }
}

/// Parse a TEI document and run cleanup, segmentation and duplication on it
pub fn segment_xml(xml: &str, segmenter: &Segmenter) -> Result<(Document, SegmentationStats), DocumentError> {
    let mut doc = Document::parse(xml)?;
    let cleaned = clean_document(&mut doc);
    let stats = segment_document(&mut doc, segmenter);
    let duplicated = duplicate_segments(&mut doc);
    debug!(
        "Prepared document: {} units cleaned, {} segments, {} duplicated",
        cleaned, stats.segments, duplicated
    );
    Ok((doc, stats))
}

/// Build the configured normalization model, wrapped in the cache when enabled
pub fn build_model(config: &Config) -> Result<Box<dyn NormalizationModel>> {
    let provider = config.normalization.resolved_provider_config();
    let model: Box<dyn NormalizationModel> = match config.normalization.provider {
        ModelProvider::Http => Box::new(HttpModel::new(
            provider.endpoint.clone(),
            provider.model.clone(),
            Some(provider.api_key.clone()),
            provider.beam_size,
            provider.timeout_secs,
        )),
        ModelProvider::Ollama => Box::new(OllamaModel::new(
            provider.endpoint.clone(),
            provider.model.clone(),
            provider.system_prompt.clone(),
            provider.temperature,
            provider.timeout_secs,
        )),
    };

    if !config.cache.enabled {
        return Ok(model);
    }

    let connection = match &config.cache.path {
        Some(path) => DatabaseConnection::open(path)?,
        None => DatabaseConnection::open_default()?,
    };
    info!("Normalization cache: {}", connection.path().display());
    Ok(Box::new(CachedModel::new(model).with_repository(CacheRepository::new(connection))))
}

/// Main application controller for TEI processing
pub struct Controller<M = Box<dyn NormalizationModel>> {
    // @field: App configuration
    config: Config,
    // @field: Sentence splitter
    segmenter: Segmenter,
    // @field: Batched model driver
    normalizer: BatchNormalizer<M>,
}

impl Controller {
    // @method: Create a new controller with the model described by the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let model = build_model(&config)?;
        Self::with_model(config, model)
    }
}

impl<M: NormalizationModel> Controller<M> {
    // @method: Create a new controller around an explicit model
    pub fn with_model(config: Config, model: M) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let segmenter = config.segmenter()?;
        let normalizer = BatchNormalizer::new(model, config.cleaner()?, config.normalization.normalizer_options())?;
        Ok(Self { config, segmenter, normalizer })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Model in use
    pub fn model(&self) -> &M {
        self.normalizer.model()
    }

    /// Process every TEI file below `input_path` (or that single file)
    pub async fn run(&self, input_path: &Path, force_overwrite: bool) -> Result<RunSummary> {
        let start_time = Instant::now();

        if !input_path.exists() {
            return Err(anyhow!("Input path does not exist: {:?}", input_path));
        }

        let (input_root, documents) = if input_path.is_file() {
            let root = input_path.parent().unwrap_or(Path::new("")).to_path_buf();
            (root, vec![input_path.to_path_buf()])
        } else {
            let documents = FileManager::find_documents(input_path, &self.config.paths.output_suffix)?;
            (input_path.to_path_buf(), documents)
        };

        if documents.is_empty() {
            return Err(anyhow!("No TEI files found in: {:?}", input_path));
        }

        let output_root = self.config.paths.output_root(&input_root);

        info!(
            "origreg: {} - {} ({} documents)",
            self.config.normalization.provider.display_name(),
            self.normalizer.model().model_name(),
            documents.len()
        );
        if let Err(e) = self.normalizer.model().test_connection().await {
            warn!("Model connection test failed: {}", e);
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(documents.len() as u64));
        folder_pb.set_style(bar_style("files"));
        folder_pb.set_message("Processing files");

        let mut summary = RunSummary::default();
        let mut produced = Vec::new();
        let mut fatal = None;

        for document in &documents {
            let file_name = document.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            match self.process_document(document, &input_root, &output_root, force_overwrite, &multi_progress).await {
                Ok(DocumentOutcome::Written { output, segmentation, normalization }) => {
                    summary.processed += 1;
                    summary.segments += segmentation.segments;
                    summary.missing_results += normalization.missing_results;
                    produced.push(output);
                }
                Ok(DocumentOutcome::Skipped { output }) => {
                    warn!("Skipping {}, output already exists: {:?} (use -f to force overwrite)", file_name, output);
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.failed += 1;
                    summary.failures.push((document.clone(), format!("{:#}", e)));
                    if self.config.normalization.fail_fast {
                        fatal = Some(e.context(format!("Stopped at {}", document.display())));
                        break;
                    }
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let outputs = self.relocate_outputs(&produced, &output_root, &mut summary);
        summary.outputs = outputs;
        summary.duration = start_time.elapsed();

        info!("Run completed: {}", summary.describe());
        if summary.has_failures() {
            self.write_issues_log(&input_root, &summary);
        }

        match fatal {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Run the whole pipeline on one document and write the result
    pub async fn process_document(
        &self,
        input_file: &Path,
        input_root: &Path,
        output_root: &Path,
        force_overwrite: bool,
        multi_progress: &MultiProgress,
    ) -> Result<DocumentOutcome> {
        let output = FileManager::generate_output_path(
            input_file,
            input_root,
            output_root,
            &self.config.paths.output_suffix,
        );
        if !force_overwrite {
            if let Some(existing) = self.existing_output(&output, output_root) {
                return Ok(DocumentOutcome::Skipped { output: existing });
            }
        }

        let xml = FileManager::read_to_string(input_file)?;
        let (mut doc, segmentation) = segment_xml(&xml, &self.segmenter)
            .with_context(|| format!("Failed to parse {:?}", input_file))?;
        if segmentation.empty_units > 0 {
            debug!("{} units without text in {:?}", segmentation.empty_units, input_file);
        }

        let total = segment_parts_mut(&mut doc.root, CANDIDATE).len();
        let progress_bar = multi_progress.add(ProgressBar::new(total as u64));
        progress_bar.set_style(bar_style("segments"));
        progress_bar.set_message("Normalizing");

        let pb = progress_bar.clone();
        let result = self.normalizer
            .normalize_document(&mut doc, move |progress: &BatchProgress| {
                pb.set_position(progress.completed as u64);
                for sample in &progress.samples {
                    debug!("Sample: {}", sample);
                }
                if let Some(sample) = progress.samples.first() {
                    pb.set_message(sample.to_string());
                }
            })
            .await;

        // Clear the per-document bar so only the folder bar stays visible
        progress_bar.finish_and_clear();
        let normalization = result.with_context(|| format!("Normalization failed for {:?}", input_file))?;

        FileManager::write_to_file(&output, &doc.to_xml_string())?;
        info!("Success: {}", output.display());

        Ok(DocumentOutcome::Written { output, segmentation, normalization })
    }

    /// Output from an earlier run, either still in place or already moved into the results directory
    fn existing_output(&self, output: &Path, output_root: &Path) -> Option<PathBuf> {
        if output.exists() {
            return Some(output.to_path_buf());
        }
        let relative = output.strip_prefix(output_root).ok()?;
        let moved = Path::new(&self.config.paths.results_dir).join(relative);
        moved.exists().then_some(moved)
    }

    /// Move produced files into the results directory, keeping their sub-path
    fn relocate_outputs(&self, produced: &[PathBuf], output_root: &Path, summary: &mut RunSummary) -> Vec<PathBuf> {
        let results_dir = PathBuf::from(&self.config.paths.results_dir);
        if produced.is_empty() {
            return Vec::new();
        }
        if let Err(e) = FileManager::ensure_dir(&results_dir) {
            error!("Cannot create results directory {:?}: {}", results_dir, e);
            return produced.to_vec();
        }

        produced
            .iter()
            .map(|output| match FileManager::relocate(output, output_root, &results_dir) {
                Ok(target) => target,
                Err(e) => {
                    error!("Failed to move {:?} into {:?}: {:#}", output, results_dir, e);
                    summary.failures.push((output.clone(), format!("{:#}", e)));
                    output.clone()
                }
            })
            .collect()
    }

    /// Append the failures of the run to the issues log
    fn write_issues_log(&self, input_root: &Path, summary: &RunSummary) {
        let log_file_path = input_root.join(ISSUES_LOG_FILENAME);
        let mut content = format!(
            "Run summary ({} - {}): {}",
            self.config.normalization.provider,
            self.normalizer.model().model_name(),
            summary.describe()
        );
        for (path, message) in &summary.failures {
            content.push_str(&format!("\n  {}: {}", path.display(), message));
        }

        if let Err(e) = FileManager::append_to_log_file(&log_file_path, &content) {
            warn!("Failed to write logs to file: {}", e);
        } else {
            info!("Issues written to {}", log_file_path.display());
        }
    }
}

fn bar_style(unit: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        ))
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

// Format duration in a human-readable format (HH:MM:SS)
fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
