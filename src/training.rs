// WHY: training entry point; extracts features over the whole corpus, fits the classifier and
// optionally classifies every newline again for a report

use std::time::Instant;
use tracing::info;

use crate::classifier::{self, ClassifierModel, Normalization};
use crate::config::EndLinesConfig;
use crate::document::Document;
use crate::error::Result;
use crate::features::{FeatureExtractor, FeatureVector};
use crate::predictor::ClassifiedNewline;
use crate::report::Report;

/// Fitted model plus the optional per-newline report
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: ClassifierModel,
    pub report: Option<Report>,
}

/// Fit a model over `documents`
pub fn train(documents: &[Document], config: &EndLinesConfig) -> Result<TrainingOutcome> {
    config.validate()?;
    let start_time = Instant::now();

    let extractor = FeatureExtractor::new(config.features.clone())?;
    let (stats, extracted) = extractor.extract_corpus(documents);

    let samples: Vec<FeatureVector> = extracted
        .iter()
        .flat_map(|doc| doc.iter().map(|item| item.features))
        .collect();

    info!(
        documents = documents.len(),
        newlines = samples.len(),
        corpus_median = stats.corpus_median,
        scope = ?config.features.scope,
        "Extracted training features"
    );

    let normalization = Normalization {
        features: config.features.clone(),
        corpus_median: stats.corpus_median,
    };
    let model = classifier::fit(&samples, normalization, &config.fit, &config.decision)?;

    let report = config.report.then(|| {
        let mut report = Report::new();
        for doc in &extracted {
            report.extend(doc.iter().map(|item| ClassifiedNewline {
                event: item.event,
                features: item.features,
                label: model.classify(&item.features),
            }));
        }
        report
    });

    if let Some(ref report) = report {
        let (spaces, end_lines) = report.label_counts();
        info!(spaces, end_lines, "Classified training corpus");
    }

    info!(
        duration_ms = start_time.elapsed().as_millis() as u64,
        "Training completed"
    );

    Ok(TrainingOutcome { model, report })
}
