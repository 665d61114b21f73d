use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use endlines::discovery::{self, DiscoveryConfig};
use endlines::reader::{self, ReaderConfig};
use endlines::{store, train, EndLinesConfig, Predictor, Report};

#[derive(Parser, Debug)]
#[command(name = "endlines")]
#[command(about = "Classify newlines as soft wraps or structural line breaks")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit a model on every document under a corpus directory
    Train {
        /// Root directory of the corpus
        root_dir: PathBuf,

        /// Where to write the fitted model
        #[arg(long, default_value = "endlines-model.json")]
        model: PathBuf,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a per-newline report (TSV)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Seed for the mixture initialisation, overrides the configuration
        #[arg(long)]
        seed: Option<u64>,

        /// Extension of corpus documents
        #[arg(long, default_value = "txt")]
        extension: String,

        /// Abort on first error
        #[arg(long)]
        fail_fast: bool,

        /// Suppress console progress bars
        #[arg(long)]
        no_progress: bool,
    },
    /// Label the newlines of documents with a saved model
    Predict {
        /// Model written by `train`
        model: PathBuf,

        /// Documents to label
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write a per-newline report (TSV)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Abort on first error
        #[arg(long)]
        fail_fast: bool,
    },
}

/// One line of `predict` output
#[derive(Serialize)]
struct PredictionLine<'a> {
    document_id: &'a str,
    newlines: Vec<NewlineLine>,
}

#[derive(Serialize)]
struct NewlineLine {
    offset: usize,
    label: &'static str,
    confidence: f64,
    source: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: structured JSON logging enables observability and debugging in production
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();
    info!(?args, "Parsed CLI arguments");

    match args.command {
        Command::Train {
            root_dir,
            model,
            config,
            report,
            seed,
            extension,
            fail_fast,
            no_progress,
        } => {
            let mut config = match config {
                Some(path) => EndLinesConfig::from_toml_file(&path)
                    .with_context(|| format!("Failed to load configuration {}", path.display()))?,
                None => EndLinesConfig::default(),
            };
            if let Some(seed) = seed {
                config.fit.seed = seed;
            }
            config.report = config.report || report.is_some();

            let discovery_config = DiscoveryConfig { fail_fast, extension };
            let discovered = discovery::collect_discovered_files(&root_dir, discovery_config).await?;
            let paths: Vec<PathBuf> = discovered
                .into_iter()
                .filter(|f| f.error.is_none())
                .map(|f| f.path)
                .collect();

            let reader_config = ReaderConfig {
                fail_fast,
                show_progress: !no_progress,
            };
            let (documents, _stats) = reader::read_documents(&paths, &reader_config).await?;
            info!("Training on {} documents", documents.len());

            // WHY: fitting is CPU-bound and uses rayon; keep it off the async workers
            let outcome = tokio::task::spawn_blocking(move || train(&documents, &config)).await??;

            store::save_async(&outcome.model, &model).await?;
            if let (Some(path), Some(rows)) = (report, outcome.report.as_ref()) {
                rows.write_tsv(&path).await?;
                info!("Wrote report with {} rows to {}", rows.len(), path.display());
            }

            let summary = outcome.model.summary();
            println!("endlines v{} - model written to {}", env!("CARGO_PKG_VERSION"), model.display());
            println!(
                "  newlines: {} ({} rule-resolved, {} fitted)",
                summary.events, summary.rule_resolved, summary.fitted
            );
            println!("  iterations: {}, converged: {}", summary.iterations, summary.converged);
        }
        Command::Predict {
            model,
            files,
            report,
            fail_fast,
        } => {
            let model = store::load_async(&model)
                .await
                .with_context(|| format!("Failed to load model {}", model.display()))?;
            let predictor = Predictor::new(model)?;

            let reader_config = ReaderConfig {
                fail_fast,
                show_progress: false,
            };
            let (documents, _stats) = reader::read_documents(&files, &reader_config).await?;

            let mut rows = Report::new();
            for document in &documents {
                let classified = predictor.classify(document);
                let line = PredictionLine {
                    document_id: document.id(),
                    newlines: classified
                        .iter()
                        .map(|item| NewlineLine {
                            offset: item.event.offset,
                            label: item.label.kind.as_str(),
                            confidence: item.label.confidence,
                            source: item.label.source.to_string(),
                        })
                        .collect(),
                };
                println!("{}", serde_json::to_string(&line)?);
                if report.is_some() {
                    rows.extend(classified);
                }
            }

            if let Some(path) = report {
                rows.write_tsv(&path).await?;
                info!("Wrote report with {} rows to {}", rows.len(), path.display());
            }
        }
    }

    Ok(())
}
