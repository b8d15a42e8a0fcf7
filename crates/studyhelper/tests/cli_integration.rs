//! CLI integration tests for the studyhelper binary.
//!
//! Input is piped through stdin, so prompts themselves are not echoed; the
//! tests check what the shell prints in response. Every test runs in its own
//! temporary directory with hash embeddings, so no model download or network
//! access is needed.

use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A studyhelper command isolated inside `dir`.
fn studyhelper(dir: &Path) -> Command {
    std::fs::write(
        dir.join("studyhelper.toml"),
        "[embedding]\nprovider = \"hash\"\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("studyhelper").unwrap();
    cmd.current_dir(dir)
        .arg("--config")
        .arg(dir.join("config"))
        .env_remove("OPENAI_API_KEY")
        .env_remove("STUDYHELPER_CONFIG_DIR");
    cmd
}

fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    Command::cargo_bin("studyhelper")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("study guides"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--memory-dir"));
}

#[test]
fn test_version_displays() {
    Command::cargo_bin("studyhelper")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("studyhelper"));
}

#[test]
fn test_unknown_flag_rejected() {
    Command::cargo_bin("studyhelper")
        .unwrap()
        .arg("--no-such-flag")
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Shell Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_path_exits() {
    let dir = TempDir::new().unwrap();
    studyhelper(dir.path())
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No file path provided. Exiting..."));
}

#[test]
fn test_closed_stdin_exits_cleanly() {
    let dir = TempDir::new().unwrap();
    studyhelper(dir.path()).write_stdin("").assert().success();
}

#[test]
fn test_unsupported_file_type() {
    let dir = TempDir::new().unwrap();
    studyhelper(dir.path())
        .write_stdin("notes.txt\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Error reading file: Unsupported file type. Use PDF or DOCX.",
        ));
}

#[test]
fn test_missing_pdf_still_previews() {
    let dir = TempDir::new().unwrap();
    studyhelper(dir.path())
        .write_stdin("missing.pdf\nn\nn\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Error reading PDF"))
        .stdout(predicate::str::contains("---Document Preview---"));
}

#[test]
fn test_docx_preview_and_save() {
    let dir = TempDir::new().unwrap();
    write_docx(
        &dir.path().join("lecture.docx"),
        &["Photosynthesis makes sugar. Plants need light.", "Chlorophyll is green."],
    );

    studyhelper(dir.path())
        .arg("--memory-dir")
        .arg(dir.path().join("mem"))
        .write_stdin("lecture.docx\ny\nn\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generating document preview..."))
        .stdout(predicate::str::contains("Processed document preview:"))
        .stdout(predicate::str::contains("---Summary---"))
        .stdout(predicate::str::contains("--- Key Concepts ---"))
        .stdout(predicate::str::contains("1.Photosynthesis makes sugar"))
        .stdout(predicate::str::contains("Day 1: Read introduction"))
        .stdout(predicate::str::contains("Saved to study_preview.txt"));

    let saved = std::fs::read_to_string(dir.path().join("study_preview.txt")).unwrap();
    assert!(saved.starts_with("Processed document preview:"));
    assert!(dir.path().join("mem").join("study_memory.db").exists());
}

#[test]
fn test_guide_without_api_key_reports_error() {
    let dir = TempDir::new().unwrap();
    write_docx(&dir.path().join("notes.docx"), &["Cells divide."]);

    studyhelper(dir.path())
        .write_stdin("notes.docx\nn\ny\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("---Study Guide Output---"))
        .stdout(predicate::str::contains(
            "Cannot generate study guide: API error (openai)",
        ))
        .stdout(predicate::str::contains("OPENAI_API_KEY"));

    assert!(!dir.path().join("study_guide.txt").exists());
}

#[test]
fn test_process_another_file_loops() {
    let dir = TempDir::new().unwrap();
    write_docx(&dir.path().join("a.docx"), &["First document."]);
    write_docx(&dir.path().join("b.docx"), &["Second document."]);

    studyhelper(dir.path())
        .write_stdin("a.docx\nn\nn\ny\nb.docx\nn\nn\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("1.First document."))
        .stdout(predicate::str::contains("1.Second document."));
}

#[test]
fn test_project_config_sets_memory_dir() {
    let dir = TempDir::new().unwrap();
    write_docx(&dir.path().join("a.docx"), &["Notes."]);

    let mut cmd = studyhelper(dir.path());
    std::fs::write(
        dir.path().join("studyhelper.toml"),
        "[embedding]\nprovider = \"hash\"\n\n[memory]\ndirectory = \"db\"\n",
    )
    .unwrap();

    cmd.write_stdin("a.docx\nn\nn\nn\n").assert().success();
    assert!(dir.path().join("db").join("study_memory.db").exists());
}
