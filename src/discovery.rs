use anyhow::Result;
use futures::stream::{self, Stream, StreamExt};
use ignore::{WalkBuilder, WalkState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Configuration for corpus discovery
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
    /// File extension of corpus documents, without the dot
    pub extension: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            extension: "txt".to_string(),
        }
    }
}

/// Result of file discovery validation
#[derive(Debug, Clone)]
pub struct FileValidation {
    pub path: PathBuf,
    pub error: Option<String>,
}

/// Streams every file under `root_dir` whose extension matches the configuration.
///
/// # Arguments
/// * `root_dir` - Root directory to search recursively
/// * `config` - Discovery configuration (fail_fast behavior, extension)
///
/// # Returns
/// Stream of `FileValidation` results; with `fail_fast` the stream ends after the first error
pub fn discover_documents(
    root_dir: impl AsRef<Path>,
    config: DiscoveryConfig,
) -> impl Stream<Item = Result<FileValidation>> {
    let root_path = root_dir.as_ref().to_path_buf();
    let config = Arc::new(config);
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        info!("Starting corpus traversal in: {}", root_path.display());
        let traversal_start = std::time::Instant::now();

        // WHY: ignore's parallel walker is the ripgrep traversal; hidden files and ignore files
        // are not special in a document corpus
        let walker = WalkBuilder::new(&root_path)
            .threads((num_cpus::get() / 2).max(1))
            .follow_links(false)
            .hidden(false)
            .ignore(false)
            .git_ignore(false)
            .build_parallel();

        // WHY: walker threads send without blocking; this task awaits paths instead of parking
        // a runtime worker on a synchronous receive
        let (path_tx, mut path_rx) = mpsc::unbounded_channel::<PathBuf>();
        let extension = config.extension.clone();

        std::thread::spawn(move || {
            walker.run(|| {
                let path_tx = path_tx.clone();
                let extension = extension.clone();
                Box::new(move |result| {
                    if let Ok(entry) = result {
                        let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
                        let matches = entry
                            .path()
                            .extension()
                            .and_then(|ext| ext.to_str())
                            .is_some_and(|ext| ext.eq_ignore_ascii_case(&extension));
                        if is_file && matches {
                            debug!("Found corpus file: {}", entry.path().display());
                            let _ = path_tx.send(entry.path().to_path_buf());
                        }
                    }
                    WalkState::Continue
                })
            });
        });

        let mut file_count = 0;
        while let Some(path) = path_rx.recv().await {
            file_count += 1;
            match validate_file(&path, &config).await {
                Ok(validation) => {
                    if tx.send(Ok(validation)).is_err() {
                        debug!("Receiver dropped, stopping discovery");
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }

        info!(
            "Discovery completed in {}ms, streamed {} files",
            traversal_start.elapsed().as_millis(),
            file_count
        );
    });

    stream::unfold(rx, |mut receiver| async move {
        receiver.recv().await.map(|result| (result, receiver))
    })
}

async fn validate_file(path: &Path, config: &DiscoveryConfig) -> Result<FileValidation> {
    let error = match fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => None,
        Ok(_) => Some(format!("Path is not a file: {}", path.display())),
        Err(e) => Some(format!("Cannot access file {}: {}", path.display(), e)),
    };

    match error {
        Some(error) if config.fail_fast => Err(anyhow::anyhow!(error)),
        Some(error) => {
            warn!("{}", error);
            Ok(FileValidation {
                path: path.to_path_buf(),
                error: Some(error),
            })
        }
        None => Ok(FileValidation {
            path: path.to_path_buf(),
            error: None,
        }),
    }
}

/// Collect all discovered files, sorted by path so corpus order is reproducible
pub async fn collect_discovered_files(
    root_dir: impl AsRef<Path>,
    config: DiscoveryConfig,
) -> Result<Vec<FileValidation>> {
    let root_dir = root_dir.as_ref();
    if !root_dir.is_dir() {
        anyhow::bail!("Corpus root is not a directory: {}", root_dir.display());
    }

    let mut files = Vec::new();
    let mut stream = Box::pin(discover_documents(root_dir, config));

    while let Some(result) = stream.next().await {
        files.push(result?);
    }

    // WHY: the parallel walker yields files in nondeterministic order; fitting must not depend on it
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let valid_count = files.iter().filter(|f| f.error.is_none()).count();
    info!(
        "File discovery summary: {} valid, {} invalid",
        valid_count,
        files.len() - valid_count
    );

    Ok(files)
}
