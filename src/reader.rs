use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::document::Document;

/// Configuration for corpus reading behavior
#[derive(Debug, Clone, Default)]
pub struct ReaderConfig {
    /// Whether to fail fast on first error or skip unreadable documents
    pub fail_fast: bool,
    /// Show a progress bar on stderr
    pub show_progress: bool,
}

/// Statistics for one file read
#[derive(Debug, Clone)]
pub struct ReadStats {
    pub file_path: String,
    pub bytes_read: u64,
    pub newlines: usize,
    pub duration_ms: u64,
    pub read_error: Option<String>,
}

/// Read one file as a document; the path becomes the document id
pub async fn read_document(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to open file {}", path.display()))?;
    let text = String::from_utf8(bytes)
        .with_context(|| format!("UTF-8 decoding error in {}", path.display()))?;

    Document::new(path.display().to_string(), text)
        .with_context(|| format!("Invalid document {}", path.display()))
}

/// Read many files in order
///
/// Without `fail_fast`, unreadable or empty files are logged, reported in the stats and skipped.
pub async fn read_documents(
    paths: &[PathBuf],
    config: &ReaderConfig,
) -> Result<(Vec<Document>, Vec<ReadStats>)> {
    let progress = if config.show_progress {
        let bar = ProgressBar::new(paths.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut documents = Vec::with_capacity(paths.len());
    let mut stats = Vec::with_capacity(paths.len());

    for path in paths {
        let start_time = std::time::Instant::now();
        progress.set_message(path.display().to_string());

        match read_document(path).await {
            Ok(document) => {
                debug!("Read {}: {} newlines", path.display(), document.newline_count());
                stats.push(ReadStats {
                    file_path: path.display().to_string(),
                    bytes_read: document.text().len() as u64,
                    newlines: document.newline_count(),
                    duration_ms: start_time.elapsed().as_millis() as u64,
                    read_error: None,
                });
                documents.push(document);
            }
            Err(e) => {
                if config.fail_fast {
                    progress.abandon();
                    return Err(e);
                }
                warn!("Skipping {}: {:#}", path.display(), e);
                stats.push(ReadStats {
                    file_path: path.display().to_string(),
                    bytes_read: 0,
                    newlines: 0,
                    duration_ms: start_time.elapsed().as_millis() as u64,
                    read_error: Some(format!("{e:#}")),
                });
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();

    let total_bytes: u64 = stats.iter().map(|s| s.bytes_read).sum();
    info!(
        "Read {} of {} documents ({} bytes)",
        documents.len(),
        paths.len(),
        total_bytes
    );

    Ok((documents, stats))
}
