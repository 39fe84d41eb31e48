/*!
 * Batched normalization of candidate texts.
 *
 * Candidates are cut into contiguous batches of `batch_size`, the last one
 * possibly shorter. Each batch is cleaned, sent to the model in a single
 * call and written back in order once the call succeeded. A failing call
 * aborts the pass and leaves the failing batch (and every later one)
 * untouched.
 */

use log::{debug, error, warn};
use rand::Rng;

use crate::errors::{ConfigError, NormalizationError};
use crate::providers::{NormalizationModel, NormalizedRecord};
use crate::tei::{segment_parts_mut, Document, Element, CANDIDATE, ORIGINAL};

use super::cleaner::TextCleaner;

/// Default number of candidates per model call
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Default text written when the model gives no text for an item
pub const DEFAULT_ERROR_MARKER: &str = "<ERROR>";

/// Default probability of sampling an item for the progress display
pub const DEFAULT_SAMPLE_RATE: f64 = 0.1;

/// Number of characters kept in a debug sample
const SAMPLE_PREVIEW_CHARS: usize = 20;

/// Settings of a normalization pass
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerOptions {
    /// Candidates per model call
    pub batch_size: usize,
    /// Substitute for missing results
    pub error_marker: String,
    /// Whether debug samples are drawn
    pub debug_samples: bool,
    /// Probability of sampling each item
    pub debug_sample_rate: f64,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            error_marker: DEFAULT_ERROR_MARKER.to_string(),
            debug_samples: true,
            debug_sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Input/output preview of one normalized item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Start of the cleaned input
    pub input: String,
    /// Start of the model output
    pub output: String,
}

impl Sample {
    fn new(input: &str, output: &str) -> Self {
        Self {
            input: input.chars().take(SAMPLE_PREVIEW_CHARS).collect(),
            output: output.chars().take(SAMPLE_PREVIEW_CHARS).collect(),
        }
    }
}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.input, self.output)
    }
}

/// Progress reported after each successful batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// Candidates written so far
    pub completed: usize,
    /// Candidates of the whole pass
    pub total: usize,
    /// Zero-based index of the batch just written
    pub batch_index: usize,
    /// Items picked for display
    pub samples: Vec<Sample>,
}

/// Counters of a normalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizationStats {
    /// `orig` texts changed by cleaning
    pub originals_cleaned: usize,
    /// Candidates written back
    pub candidates: usize,
    /// Model calls made
    pub batches: usize,
    /// Items replaced by the error marker
    pub missing_results: usize,
}

/// Drives a normalization model over the candidates of a document
#[derive(Debug)]
pub struct BatchNormalizer<M> {
    /// Model answering each batch
    model: M,
    /// Preprocessing applied to inputs and `orig` texts
    cleaner: TextCleaner,
    /// Pass settings
    options: NormalizerOptions,
}

impl<M: NormalizationModel> BatchNormalizer<M> {
    /// Create a normalizer
    pub fn new(model: M, cleaner: TextCleaner, options: NormalizerOptions) -> Result<Self, ConfigError> {
        if options.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "normalization.batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&options.debug_sample_rate) {
            return Err(ConfigError::InvalidValue {
                field: "normalization.debug_sample_rate".to_string(),
                reason: format!("{} is not a probability", options.debug_sample_rate),
            });
        }
        Ok(Self { model, cleaner, options })
    }

    /// Model in use
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Pass settings
    pub fn options(&self) -> &NormalizerOptions {
        &self.options
    }

    /// Clean every `orig` text in place, returning how many changed
    pub fn clean_originals(&self, originals: &mut [&mut String]) -> usize {
        let mut changed = 0;
        for text in originals.iter_mut() {
            if self.cleaner.clean_in_place(text) {
                changed += 1;
            }
        }
        changed
    }

    /// Normalize candidates in place, batch by batch.
    ///
    /// `on_progress` is called after each batch has been written.
    pub async fn normalize<F>(
        &self,
        candidates: &mut [&mut String],
        mut on_progress: F,
    ) -> Result<NormalizationStats, NormalizationError>
    where
        F: FnMut(&BatchProgress),
    {
        let total = candidates.len();
        let mut stats = NormalizationStats::default();

        for (batch_index, group) in candidates.chunks_mut(self.options.batch_size).enumerate() {
            let inputs: Vec<String> = group.iter().map(|text| self.cleaner.clean(text)).collect();

            debug!(
                "Sending batch {} ({} items) to {}",
                batch_index,
                inputs.len(),
                self.model.model_name()
            );
            let records = match self.model.normalize_batch(&inputs).await {
                Ok(records) => records,
                Err(source) => {
                    error!("Batch {} failed: {}", batch_index, source);
                    error!("Inputs of batch {}: {:?}", batch_index, inputs);
                    return Err(NormalizationError::BatchFailed { batch_index, inputs, source });
                }
            };

            let (outputs, missing) = self.collect_outputs(batch_index, &inputs, records);
            let samples = self.draw_samples(&inputs, &outputs);

            for (candidate, output) in group.iter_mut().zip(outputs) {
                **candidate = output;
            }

            stats.batches += 1;
            stats.candidates += group.len();
            stats.missing_results += missing;

            on_progress(&BatchProgress {
                completed: stats.candidates,
                total,
                batch_index,
                samples,
            });
        }

        Ok(stats)
    }

    /// Clean every `orig` and normalize every `reg` of a segmented document
    pub async fn normalize_document<F>(
        &self,
        doc: &mut Document,
        on_progress: F,
    ) -> Result<NormalizationStats, NormalizationError>
    where
        F: FnMut(&BatchProgress),
    {
        let mut originals: Vec<&mut String> = segment_parts_mut(&mut doc.root, ORIGINAL)
            .into_iter()
            .map(Element::text_mut)
            .collect();
        let originals_cleaned = self.clean_originals(&mut originals);
        drop(originals);

        let mut candidates: Vec<&mut String> = segment_parts_mut(&mut doc.root, CANDIDATE)
            .into_iter()
            .map(Element::text_mut)
            .collect();
        let stats = self.normalize(&mut candidates, on_progress).await?;

        Ok(NormalizationStats { originals_cleaned, ..stats })
    }

    fn collect_outputs(
        &self,
        batch_index: usize,
        inputs: &[String],
        records: Vec<NormalizedRecord>,
    ) -> (Vec<String>, usize) {
        if records.len() > inputs.len() {
            warn!(
                "Batch {}: model returned {} records for {} inputs, ignoring the extra ones",
                batch_index,
                records.len(),
                inputs.len()
            );
        }

        let mut records = records.into_iter();
        let mut missing = 0;
        let outputs = inputs
            .iter()
            .enumerate()
            .map(|(i, input)| match records.next().and_then(|record| record.text) {
                Some(text) => text,
                None => {
                    warn!("Batch {}: no text for item {} ({:?})", batch_index, i, input);
                    missing += 1;
                    self.options.error_marker.clone()
                }
            })
            .collect();
        (outputs, missing)
    }

    fn draw_samples(&self, inputs: &[String], outputs: &[String]) -> Vec<Sample> {
        if !self.options.debug_samples || self.options.debug_sample_rate <= 0.0 {
            return Vec::new();
        }
        let mut rng = rand::rng();
        inputs
            .iter()
            .zip(outputs)
            .filter(|_| rng.random_bool(self.options.debug_sample_rate))
            .map(|(input, output)| Sample::new(input, output))
            .collect()
    }
}
