/*!
 * Punctuation-based sentence segmentation.
 *
 * A segment is the longest run of characters outside the boundary set,
 * followed by at most one boundary character. Pieces are trimmed and empty
 * pieces are dropped, which also swallows runs of consecutive boundary
 * characters. There is no abbreviation or quote handling.
 */

use regex::Regex;

use crate::errors::ConfigError;

/// Default boundary characters
pub const DEFAULT_BOUNDARIES: &str = ".?:;!";

/// Splits unit text into sentence-like segments
#[derive(Debug, Clone)]
pub struct Segmenter {
    /// Compiled `[^B]+[B]?` pattern
    pattern: Regex,
}

impl Segmenter {
    /// Build a segmenter for the given boundary characters
    pub fn new(boundaries: &str) -> Result<Self, ConfigError> {
        let mut chars: Vec<char> = Vec::new();
        for c in boundaries.chars() {
            if c.is_whitespace() {
                return Err(ConfigError::InvalidValue {
                    field: "segmentation.boundary_chars".to_string(),
                    reason: "whitespace cannot be a boundary character".to_string(),
                });
            }
            if !chars.contains(&c) {
                chars.push(c);
            }
        }
        if chars.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "segmentation.boundary_chars".to_string(),
                reason: "at least one boundary character is required".to_string(),
            });
        }

        let class: String = chars
            .iter()
            .map(|c| regex::escape(&c.to_string()))
            .collect();
        let pattern = Regex::new(&format!("[^{class}]+[{class}]?")).map_err(|source| {
            ConfigError::InvalidPattern {
                field: "segmentation.boundary_chars".to_string(),
                source,
            }
        })?;

        Ok(Self { pattern })
    }

    /// Split `text` into trimmed, non-empty segments in reading order
    pub fn segment(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .map(|piece| piece.as_str().trim())
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            pattern: Regex::new(r"[^\.\?:;!]+[\.\?:;!]?").expect("default boundary pattern is valid"),
        }
    }
}
