// WHY: inference path; rebuilds features exactly as at training time from the model's own
// normalisation constants and returns an explicit offset -> label map for the host

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::classifier::ClassifierModel;
use crate::document::{Document, LineBreakEvent};
use crate::error::Result;
use crate::features::{median, FeatureExtractor, FeatureVector};
use crate::label::{BreakKind, Label};

/// Labels of every newline in one document, keyed by byte offset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub document_id: String,
    labels: BTreeMap<usize, Label>,
}

impl Prediction {
    pub fn labels(&self) -> &BTreeMap<usize, Label> {
        &self.labels
    }

    pub fn get(&self, offset: usize) -> Option<&Label> {
        self.labels.get(&offset)
    }

    /// Boolean flag for the host: `Some(true)` for a structural break
    pub fn is_end_line(&self, offset: usize) -> Option<bool> {
        self.labels.get(&offset).map(Label::is_end_line)
    }

    /// Offsets labelled `SPACE`, i.e. the newlines a host may treat as spaces
    pub fn space_offsets(&self) -> Vec<usize> {
        self.offsets_of(BreakKind::Space)
    }

    pub fn end_line_offsets(&self) -> Vec<usize> {
        self.offsets_of(BreakKind::EndLine)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Label)> {
        self.labels.iter().map(|(&offset, label)| (offset, label))
    }

    fn offsets_of(&self, kind: BreakKind) -> Vec<usize> {
        self.labels
            .iter()
            .filter(|(_, label)| label.kind == kind)
            .map(|(&offset, _)| offset)
            .collect()
    }
}

/// One newline with everything that went into its label
#[derive(Debug, Clone, Copy)]
pub struct ClassifiedNewline<'a> {
    pub event: LineBreakEvent<'a>,
    pub features: FeatureVector,
    pub label: Label,
}

/// Applies a fitted model to documents; cheap to share across threads
#[derive(Debug)]
pub struct Predictor {
    model: Arc<ClassifierModel>,
    extractor: FeatureExtractor,
}

impl Predictor {
    pub fn new(model: ClassifierModel) -> Result<Self> {
        Self::from_shared(Arc::new(model))
    }

    pub fn from_shared(model: Arc<ClassifierModel>) -> Result<Self> {
        let extractor = FeatureExtractor::new(model.normalization().features.clone())?;
        Ok(Self { model, extractor })
    }

    pub fn model(&self) -> &ClassifierModel {
        &self.model
    }

    /// Every newline of `document` with its features and label
    pub fn classify<'a>(&self, document: &'a Document) -> Vec<ClassifiedNewline<'a>> {
        let reference = self.extractor.reference_median(
            median(&document.line_lengths()),
            self.model.normalization().corpus_median,
        );

        self.extractor
            .extract(document, reference)
            .into_iter()
            .map(|item| ClassifiedNewline {
                event: item.event,
                features: item.features,
                label: self.model.classify(&item.features),
            })
            .collect()
    }

    /// Label every newline of `document`
    pub fn predict(&self, document: &Document) -> Prediction {
        let labels: BTreeMap<usize, Label> = self
            .classify(document)
            .into_iter()
            .map(|item| (item.event.offset, item.label))
            .collect();

        debug!(
            document_id = document.id(),
            newlines = labels.len(),
            end_lines = labels.values().filter(|l| l.is_end_line()).count(),
            "Predicted newline labels"
        );

        Prediction {
            document_id: document.id().to_string(),
            labels,
        }
    }

    /// Predict many documents in parallel; output order follows input order
    pub fn predict_batch(&self, documents: &[Document]) -> Vec<Prediction> {
        documents.par_iter().map(|doc| self.predict(doc)).collect()
    }
}

/// One-shot prediction without keeping a [`Predictor`] around
pub fn predict(model: &ClassifierModel, document: &Document) -> Result<Prediction> {
    let predictor = Predictor::new(model.clone())?;
    Ok(predictor.predict(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{fit, DecisionConfig, FitConfig, Normalization};
    use crate::features::FeatureConfig;
    use crate::label::LabelSource;

    fn cue_only_model() -> ClassifierModel {
        let samples = vec![FeatureVector::default(), FeatureVector::default()];
        let normalization = Normalization {
            features: FeatureConfig::default(),
            corpus_median: 40.0,
        };
        fit(&samples, normalization, &FitConfig::default(), &DecisionConfig::default()).unwrap()
    }

    #[test]
    fn test_every_newline_gets_one_label() {
        let predictor = Predictor::new(cue_only_model()).unwrap();
        let doc = Document::new("d", "a\nb\n\nc.\nD\n").unwrap();
        let prediction = predictor.predict(&doc);

        assert_eq!(prediction.len(), doc.newline_count());
        for offset in doc.newline_offsets() {
            assert!(prediction.get(*offset).is_some());
        }
    }

    #[test]
    fn test_document_without_newlines_gives_empty_prediction() {
        let predictor = Predictor::new(cue_only_model()).unwrap();
        let doc = Document::new("d", "no newline").unwrap();
        assert!(predictor.predict(&doc).is_empty());
    }

    #[test]
    fn test_space_and_end_line_offsets() {
        let predictor = Predictor::new(cue_only_model()).unwrap();
        let doc = Document::new("d", "J'aime le \nfromage...\n").unwrap();
        let prediction = predictor.predict(&doc);

        assert_eq!(prediction.space_offsets(), vec![10]);
        assert_eq!(prediction.end_line_offsets(), vec![21]);
        assert_eq!(prediction.is_end_line(10), Some(false));
        assert_eq!(prediction.is_end_line(21), Some(true));
        assert_eq!(prediction.is_end_line(3), None);
        assert!(matches!(prediction.get(21).unwrap().source, LabelSource::Rule(_)));
    }

    #[test]
    fn test_batch_preserves_order() {
        let predictor = Predictor::new(cue_only_model()).unwrap();
        let docs = vec![
            Document::new("first", "x\ny").unwrap(),
            Document::new("second", "z\n").unwrap(),
        ];
        let predictions = predictor.predict_batch(&docs);
        assert_eq!(predictions[0].document_id, "first");
        assert_eq!(predictions[1].document_id, "second");
    }
}
