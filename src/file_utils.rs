use anyhow::{Result, Context, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use std::fs::OpenOptions;
use std::io::Write;
use chrono::Local;

// @module: File and directory utilities

/// Extension of TEI input files
pub const XML_EXTENSION: &str = "xml";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for a segmented document
    // @params: input_file, input_root, output_root, suffix
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>, P3: AsRef<Path>>(
        input_file: P1,
        input_root: P2,
        output_root: P3,
        suffix: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();

        // Get the file stem (filename without extension)
        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push_str(suffix);
        output_filename.push('.');
        output_filename.push_str(XML_EXTENSION);

        // Keep the sub-folder of the input below the output root
        let relative_dir = input_file
            .parent()
            .and_then(|parent| parent.strip_prefix(input_root.as_ref()).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        output_root.as_ref().join(relative_dir).join(output_filename)
    }

    /// Find files with a specific extension in a directory, in a stable order
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let normalized_ext = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(normalized_ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        Ok(result)
    }

    /// Find TEI inputs below `dir`, skipping files produced by earlier runs
    pub fn find_documents<P: AsRef<Path>>(dir: P, output_suffix: &str) -> Result<Vec<PathBuf>> {
        let files = Self::find_files(dir, XML_EXTENSION)?;
        Ok(files
            .into_iter()
            .filter(|path| {
                !path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().ends_with(output_suffix))
                    .unwrap_or(false)
            })
            .collect())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Move a file, ensuring the target directory exists.
    ///
    /// Falls back to copy and delete when a rename is not possible, e.g.
    /// across file systems.
    pub fn move_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow!("Source file does not exist: {:?}", from));
        }

        // Ensure the target directory exists
        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        if fs::rename(from, to).is_err() {
            fs::copy(from, to)
                .with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
            fs::remove_file(from)
                .with_context(|| format!("Failed to remove {:?}", from))?;
        }

        Ok(())
    }

    /// Move `file` from below `from_root` to the same relative place below `to_root`
    pub fn relocate<P1: AsRef<Path>, P2: AsRef<Path>, P3: AsRef<Path>>(
        file: P1,
        from_root: P2,
        to_root: P3,
    ) -> Result<PathBuf> {
        let file = file.as_ref();
        let relative = file
            .strip_prefix(from_root.as_ref())
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(file.file_name().unwrap_or_default()));
        let target = to_root.as_ref().join(relative);

        if target != file {
            Self::move_file(file, &target)?;
        }
        Ok(target)
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Get current timestamp
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        // Open file in append mode, create if it doesn't exist
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        // Write content with timestamp
        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
