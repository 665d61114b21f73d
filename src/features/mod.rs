// WHY: turns every newline into a fixed feature vector; numeric length features feed the mixture,
// boolean cues shift the decision boundary and drive the rule overrides

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{Document, LineBreakEvent};
use crate::error::{EndLinesError, Result};
use crate::label::RuleOverride;

pub mod typography;

pub use typography::CueDetector;

/// Which median line length the length ratio is computed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationScope {
    /// Median of the document the newline belongs to
    #[default]
    Document,
    /// Median over the whole training corpus, stored in the model
    Corpus,
}

/// Feature extraction settings, stored with the fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub scope: NormalizationScope,
    /// Upper clip for the length ratio
    pub max_ratio: f64,
    /// Lines with a smaller share of visible characters count as near-empty
    pub near_empty_ratio: f64,
    pub terminal_punctuation: Vec<char>,
    pub continuation_punctuation: Vec<char>,
    pub bullet_markers: Vec<char>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            scope: NormalizationScope::Document,
            max_ratio: 3.0,
            near_empty_ratio: 0.1,
            terminal_punctuation: vec!['.', '!', '?', ':', ';'],
            continuation_punctuation: vec![',', '-'],
            bullet_markers: vec!['-', '*', '\u{2022}', '\u{2013}', '\u{B7}', '>'],
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_ratio.is_finite() && self.max_ratio > 0.0) {
            return Err(EndLinesError::Config(format!(
                "features.max_ratio must be a positive number, got {}",
                self.max_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.near_empty_ratio) {
            return Err(EndLinesError::Config(format!(
                "features.near_empty_ratio must be within [0, 1], got {}",
                self.near_empty_ratio
            )));
        }
        Ok(())
    }
}

/// Typographic context of one newline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Characters in the preceding line, trailing whitespace trimmed
    pub preceding_len: usize,
    /// Characters in the following line, trailing whitespace trimmed
    pub following_len: usize,
    /// `preceding_len` over the reference median, clipped to `max_ratio`
    pub length_ratio: f64,
    pub next_starts_upper: bool,
    pub next_starts_lower: bool,
    pub next_starts_marker: bool,
    pub prev_ends_terminal: bool,
    pub prev_ends_continuation: bool,
    pub prev_is_heading: bool,
    pub next_is_blank: bool,
    pub prev_is_near_empty: bool,
    pub is_document_end: bool,
}

impl FeatureVector {
    /// Rule that decides this newline without the statistical model, if any
    pub fn rule_override(&self) -> Option<RuleOverride> {
        if self.is_document_end {
            Some(RuleOverride::DocumentEnd)
        } else if self.next_is_blank {
            Some(RuleOverride::BlankLineFollows)
        } else if self.prev_is_near_empty {
            Some(RuleOverride::NearEmptyPrecedes)
        } else {
            None
        }
    }

    /// Punctuation or capitalisation suggesting a new structural unit
    pub fn has_structural_cue(&self) -> bool {
        self.prev_ends_terminal || self.next_starts_upper || self.next_starts_marker
    }
}

/// An event paired with its features
#[derive(Debug, Clone, Copy)]
pub struct NewlineFeatures<'a> {
    pub event: LineBreakEvent<'a>,
    pub features: FeatureVector,
}

/// Median line lengths, computed once before any vector is finalised
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStats {
    /// Median over every non-blank line of the corpus
    pub corpus_median: f64,
    /// Median per document, in corpus order
    pub document_medians: Vec<f64>,
}

impl CorpusStats {
    pub fn compute(documents: &[Document]) -> Self {
        let per_document: Vec<Vec<usize>> = documents
            .par_iter()
            .map(Document::line_lengths)
            .collect();

        let document_medians = per_document.iter().map(|lengths| median(lengths)).collect();
        let all: Vec<usize> = per_document.into_iter().flatten().collect();

        Self {
            corpus_median: median(&all),
            document_medians,
        }
    }
}

/// Median of line lengths; 0.0 for an empty slice
pub fn median(lengths: &[usize]) -> f64 {
    if lengths.is_empty() {
        return 0.0;
    }
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Stateless extractor; safe to share between threads
#[derive(Debug)]
pub struct FeatureExtractor {
    config: FeatureConfig,
    cues: CueDetector,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;
        let cues = CueDetector::new(
            config.bullet_markers.clone(),
            config.terminal_punctuation.clone(),
            config.continuation_punctuation.clone(),
        )?;
        Ok(Self { config, cues })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Reference median for a document given its own median and the corpus median
    pub fn reference_median(&self, document_median: f64, corpus_median: f64) -> f64 {
        match self.config.scope {
            NormalizationScope::Document => document_median,
            NormalizationScope::Corpus => corpus_median,
        }
    }

    /// Features of every newline in `document`
    pub fn extract<'a>(&self, document: &'a Document, reference_median: f64) -> Vec<NewlineFeatures<'a>> {
        let features: Vec<_> = document
            .events()
            .map(|event| NewlineFeatures {
                features: self.features_for(&event, reference_median),
                event,
            })
            .collect();

        debug!(
            document_id = document.id(),
            newlines = features.len(),
            reference_median,
            "Extracted newline features"
        );
        features
    }

    /// Features of every newline in every document, documents processed in parallel
    pub fn extract_corpus<'a>(&self, documents: &'a [Document]) -> (CorpusStats, Vec<Vec<NewlineFeatures<'a>>>) {
        let stats = CorpusStats::compute(documents);

        let extracted = documents
            .par_iter()
            .zip(stats.document_medians.par_iter())
            .map(|(document, &doc_median)| {
                let reference = self.reference_median(doc_median, stats.corpus_median);
                self.extract(document, reference)
            })
            .collect();

        (stats, extracted)
    }

    pub fn features_for(&self, event: &LineBreakEvent<'_>, reference_median: f64) -> FeatureVector {
        let preceding = event.preceding.trim_end();
        let following = event.following.trim_end();
        let preceding_len = preceding.chars().count();
        let following_len = following.chars().count();

        // Lines shorter than one character carry no length information
        let length_ratio = (preceding_len as f64 / reference_median.max(1.0)).min(self.config.max_ratio);

        let first = typography::first_visible_char(following);

        FeatureVector {
            preceding_len,
            following_len,
            length_ratio,
            next_starts_upper: first.is_some_and(char::is_uppercase),
            next_starts_lower: first.is_some_and(char::is_lowercase),
            next_starts_marker: self.cues.starts_with_marker(following),
            prev_ends_terminal: self.cues.ends_with_terminal(preceding),
            prev_ends_continuation: self.cues.ends_with_continuation(preceding),
            prev_is_heading: typography::is_heading(preceding),
            next_is_blank: typography::is_near_empty(event.following, self.config.near_empty_ratio),
            prev_is_near_empty: typography::is_near_empty(event.preceding, self.config.near_empty_ratio),
            is_document_end: event.at_document_end,
        }
    }
}
