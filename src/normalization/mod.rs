/*!
 * Normalization of the `reg` side of duplicated segments.
 *
 * - `cleaner`: newline flattening and leading-character stripping
 * - `batch`: batched model calls with progress reporting
 */

pub mod batch;
pub mod cleaner;

pub use self::batch::{
    BatchNormalizer, BatchProgress, NormalizationStats, NormalizerOptions, Sample,
    DEFAULT_BATCH_SIZE, DEFAULT_ERROR_MARKER, DEFAULT_SAMPLE_RATE,
};
pub use self::cleaner::{TextCleaner, DEFAULT_STRIP_PATTERN};
