/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use origreg::file_utils::FileManager;
use std::fs;
use std::path::PathBuf;

use crate::common;

/// Test discovery of TEI inputs in nested folders
#[test]
fn test_find_documents_shouldWalkSubfoldersInOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_tei(root, "b.xml")?;
    common::create_test_tei(root, "a.XML")?;
    common::create_test_tei(root, "vol2/c.xml")?;
    common::create_test_file(root, "notes.txt", "not a TEI file")?;

    let found = FileManager::find_documents(root, "_segmented")?;

    let names: Vec<PathBuf> = found
        .iter()
        .map(|path| path.strip_prefix(root).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        names,
        vec![PathBuf::from("a.XML"), PathBuf::from("b.xml"), PathBuf::from("vol2/c.xml")]
    );
    Ok(())
}

/// Test that outputs of an earlier run are not picked up again
#[test]
fn test_find_documents_shouldSkipSegmentedOutputs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_tei(root, "letter.xml")?;
    common::create_test_tei(root, "letter_segmented.xml")?;

    let found = FileManager::find_documents(root, "_segmented")?;

    assert_eq!(found, vec![root.join("letter.xml")]);
    Ok(())
}

#[test]
fn test_generate_output_path_withSeparateOutputRoot_shouldMirrorFolders() {
    let output = FileManager::generate_output_path("/data/in/vol1/lettre.xml", "/data/in", "/data/out", "_segmented");
    assert_eq!(output, PathBuf::from("/data/out/vol1/lettre_segmented.xml"));
}

#[test]
fn test_generate_output_path_withInputOutsideRoot_shouldUseOutputRoot() {
    let output = FileManager::generate_output_path("/elsewhere/lettre.xml", "/data/in", "/data/out", "_seg");
    assert_eq!(output, PathBuf::from("/data/out/lettre_seg.xml"));
}

/// Test moving a file into a results folder that does not exist yet
#[test]
fn test_relocate_shouldKeepRelativePath() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let file = common::create_test_file(root, "in/vol1/letter_segmented.xml", "<TEI/>")?;

    let target = FileManager::relocate(&file, root.join("in"), root.join("results"))?;

    assert_eq!(target, root.join("results/vol1/letter_segmented.xml"));
    assert!(!file.exists());
    assert_eq!(fs::read_to_string(&target)?, "<TEI/>");
    Ok(())
}

#[test]
fn test_relocate_withFileOutsideRoot_shouldUseFileName() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    let file = common::create_test_file(root, "other/letter.xml", "<TEI/>")?;

    let target = FileManager::relocate(&file, root.join("in"), root.join("results"))?;

    assert_eq!(target, root.join("results/letter.xml"));
    assert!(target.exists());
    Ok(())
}

#[test]
fn test_move_file_withMissingSource_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let result = FileManager::move_file(temp_dir.path().join("missing.xml"), temp_dir.path().join("to.xml"));
    assert!(result.is_err());
    Ok(())
}

/// Test that log lines are appended with a timestamp
#[test]
fn test_append_to_log_file_shouldAppendTimestampedLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log_path = temp_dir.path().join("logs/origreg.issues.log");

    FileManager::append_to_log_file(&log_path, "first issue")?;
    FileManager::append_to_log_file(&log_path, "second issue")?;

    let content = fs::read_to_string(&log_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('['));
    assert!(lines[0].ends_with("] first issue"));
    assert!(lines[1].ends_with("] second issue"));
    Ok(())
}

#[test]
fn test_write_to_file_shouldCreateParentFolders() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("a/b/out.xml");

    FileManager::write_to_file(&path, "<TEI/>")?;

    assert!(FileManager::file_exists(&path));
    assert!(temp_dir.path().join("a/b").is_dir());
    assert_eq!(FileManager::read_to_string(&path)?, "<TEI/>");
    Ok(())
}
