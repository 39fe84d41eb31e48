/*!
 * Text preprocessing applied before normalization.
 *
 * Every line break becomes a single space, then a leading run of
 * characters matching the strip pattern is removed. Only the start of
 * the text is touched.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ConfigError;

/// Default leading-strip pattern: whitespace, hyphens, parentheses and quotes
pub const DEFAULT_STRIP_PATTERN: &str = r#"^[\s\-()'"]+"#;

static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\n|\r").expect("valid newline pattern"));

/// Cleans segment text before it reaches the model
#[derive(Debug, Clone)]
pub struct TextCleaner {
    /// Anchored pattern removed from the start of the text
    strip: Regex,
}

impl TextCleaner {
    /// Build a cleaner for the given leading-strip pattern.
    ///
    /// The pattern must start with `^` so it can only remove leading
    /// characters.
    pub fn new(strip_pattern: &str) -> Result<Self, ConfigError> {
        if !strip_pattern.starts_with('^') {
            return Err(ConfigError::InvalidValue {
                field: "normalization.strip_pattern".to_string(),
                reason: format!("pattern '{}' must be anchored with '^'", strip_pattern),
            });
        }
        let strip = Regex::new(strip_pattern).map_err(|source| ConfigError::InvalidPattern {
            field: "normalization.strip_pattern".to_string(),
            source,
        })?;
        Ok(Self { strip })
    }

    /// Clean one text
    pub fn clean(&self, text: &str) -> String {
        let flattened = NEWLINES.replace_all(text, " ");
        match self.strip.find(&flattened) {
            Some(found) if found.start() == 0 => flattened.as_ref()[found.end()..].to_string(),
            _ => flattened.into_owned(),
        }
    }

    /// Clean a text in place, returning whether it changed
    pub fn clean_in_place(&self, text: &mut String) -> bool {
        let cleaned = self.clean(text);
        if cleaned == *text {
            return false;
        }
        *text = cleaned;
        true
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self {
            strip: Regex::new(DEFAULT_STRIP_PATTERN).expect("default strip pattern is valid"),
        }
    }
}
