/*!
 * Common test utilities for the origreg test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tempfile::TempDir;

use origreg::app_config::Config;

/// Two paragraphs and a speech block, with editorial markup inside the units
pub const SAMPLE_TEI: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc><titleStmt><title>Lettre</title></titleStmt></fileDesc>
  </teiHeader>
  <text>
    <body>
      <div type="lettre">
        <p xml:id="p1">Monsieur, ie vous escris ceste let<lb break="no"/>tre. Est-il vray? Ouy!</p>
        <p xml:id="p2">- Ie suis<note>marge</note> vostre serviteur.</p>
        <ab>Adieu; a bientost</ab>
      </div>
    </body>
  </text>
</TEI>
"#;

/// Initialise logging once for tests that want to see log output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample TEI file for testing
pub fn create_test_tei(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_TEI)
}

/// Configuration reading from `<root>/in` and moving results to `<root>/results`
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.input_dir = root.join("in").to_string_lossy().to_string();
    config.paths.results_dir = root.join("results").to_string_lossy().to_string();
    config.normalization.debug_samples = false;
    config
}
