// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use endlines::{BreakKind, Document, Prediction};

/// Test fixture helper for a temporary corpus directory
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();

        Self { temp_dir, root_path }
    }

    /// Write a corpus document, creating parent directories as needed
    pub fn create_document<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    /// Model path inside the fixture, outside the corpus files
    pub fn model_path(&self) -> PathBuf {
        self.root_path.join("models").join("endlines-model.json")
    }

    pub fn report_path(&self) -> PathBuf {
        self.root_path.join("report.tsv")
    }
}

/// Build in-memory documents from (id, text) pairs
pub fn documents(notes: &[(&str, &str)]) -> Vec<Document> {
    notes
        .iter()
        .map(|(id, text)| Document::new(*id, *text).expect("Fixture document should be valid"))
        .collect()
}

/// Byte offset of the newline that ends the line ending in `line_end`
pub fn newline_after(text: &str, line_end: &str) -> usize {
    let pattern = format!("{line_end}\n");
    let start = text
        .find(&pattern)
        .unwrap_or_else(|| panic!("{line_end:?} is not followed by a newline"));
    start + line_end.len()
}

/// Expected labels of a fixed-width note: a line closed by a period ends its paragraph
pub fn expected_by_punctuation(text: &str) -> Vec<(usize, BreakKind)> {
    let mut expected = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches('\n');
        offset += line.len();
        if line.ends_with('\n') {
            let kind = if content.ends_with('.') {
                BreakKind::EndLine
            } else {
                BreakKind::Space
            };
            expected.push((offset - 1, kind));
        }
    }
    expected
}

/// Compare a prediction with expected labels, reporting the first mismatching line
pub fn assert_labels(prediction: &Prediction, text: &str, expected: &[(usize, BreakKind)]) {
    assert_eq!(
        prediction.len(),
        expected.len(),
        "{}: every newline must carry exactly one label",
        prediction.document_id
    );

    for &(offset, kind) in expected {
        let label = prediction
            .get(offset)
            .unwrap_or_else(|| panic!("{}: no label at offset {offset}", prediction.document_id));
        if label.kind != kind {
            let line_start = text[..offset].rfind('\n').map_or(0, |p| p + 1);
            panic!(
                "{}: newline at {offset} after {:?}\nExpected: {kind}\nActual:   {} ({})",
                prediction.document_id,
                &text[line_start..offset],
                label.kind,
                label.source
            );
        }
    }
}
