// End-to-end labelling behaviour on small clinical corpora
// WHY: exercises feature extraction, the fitted mixture and the rule overrides together

use endlines::classifier::{AssignmentRule, FlatReason};
use endlines::{
    train, BreakKind, Document, EndLinesConfig, LabelSource, LengthModel, NormalizationScope, Predictor,
    RuleOverride,
};

#[path = "integration/fixtures/mod.rs"]
mod fixtures;
use fixtures::*;

#[path = "integration/mod.rs"]
mod test_utils;
use test_utils::{assert_labels, documents, expected_by_punctuation, newline_after};

fn trained_predictor(notes: &[(&str, &str)], config: &EndLinesConfig) -> Predictor {
    let outcome = train(&documents(notes), config).expect("Training should succeed");
    Predictor::new(outcome.model).expect("Predictor creation should succeed")
}

/// Wrapped lines and paragraph ends separate into two length clusters
#[test]
fn test_fixed_width_corpus_is_labelled_by_layout() {
    let notes = training_notes();
    let predictor = trained_predictor(&notes, &EndLinesConfig::default());

    match predictor.model().length_model() {
        LengthModel::Mixture { mixture, convention } => {
            assert_eq!(convention.end_line_component, 0);
            assert_eq!(convention.rule, AssignmentRule::ShortLinesUppercaseFollow);
            assert!(mixture.components[0].mean < mixture.components[1].mean);
        }
        other => panic!("Expected a fitted mixture, got {other:?}"),
    }

    for doc in documents(&notes) {
        let prediction = predictor.predict(&doc);
        assert_labels(&prediction, doc.text(), &expected_by_punctuation(doc.text()));
    }
}

#[test]
fn test_blank_line_and_heading_scenario() {
    let mut notes = training_notes();
    notes.push(("arrivee", HEADING_SCENARIO));
    let predictor = trained_predictor(&notes, &EndLinesConfig::default());

    let doc = Document::new("arrivee", HEADING_SCENARIO).unwrap();
    let prediction = predictor.predict(&doc);
    assert_eq!(prediction.len(), 5);

    let sentence_end = prediction.get(newline_after(HEADING_SCENARIO, "soir.")).unwrap();
    assert_eq!(sentence_end.kind, BreakKind::EndLine);
    assert_eq!(sentence_end.source, LabelSource::Model);

    let before_blank = newline_after(HEADING_SCENARIO, "fils");
    let label = prediction.get(before_blank).unwrap();
    assert_eq!(label.kind, BreakKind::EndLine);
    assert_eq!(label.source, LabelSource::Rule(RuleOverride::BlankLineFollows));
    assert_eq!(label.confidence, 1.0);

    let blank = prediction.get(before_blank + 1).unwrap();
    assert_eq!(blank.source, LabelSource::Rule(RuleOverride::NearEmptyPrecedes));

    let heading = prediction.get(newline_after(HEADING_SCENARIO, "ANTECEDENTS")).unwrap();
    assert_eq!(heading.kind, BreakKind::EndLine);
    assert_eq!(heading.source, LabelSource::Model);

    let last = prediction.get(newline_after(HEADING_SCENARIO, "amlodipine.")).unwrap();
    assert_eq!(last.source, LabelSource::Rule(RuleOverride::DocumentEnd));
}

#[test]
fn test_mid_sentence_wrap_is_space() {
    let predictor = trained_predictor(&training_notes(), &EndLinesConfig::default());

    let doc = Document::new("fromage", WRAPPED_SCENARIO).unwrap();
    let prediction = predictor.predict(&doc);

    assert_eq!(prediction.len(), 2);
    assert_eq!(prediction.is_end_line(10), Some(false));
    assert_eq!(prediction.get(10).unwrap().source, LabelSource::Model);
    assert_eq!(prediction.is_end_line(21), Some(true));
    assert_eq!(
        prediction.get(21).unwrap().source,
        LabelSource::Rule(RuleOverride::DocumentEnd)
    );
    assert_eq!(prediction.space_offsets(), vec![10]);
    assert_eq!(prediction.end_line_offsets(), vec![21]);
}

/// A single short document leaves too few samples for the mixture; cues still decide
#[test]
fn test_scenario_alone_uses_cues_only() {
    let predictor = trained_predictor(&[("arrivee", HEADING_SCENARIO)], &EndLinesConfig::default());
    assert_eq!(
        predictor.model().length_model(),
        &LengthModel::Flat {
            reason: FlatReason::TooFewSamples
        }
    );

    let doc = Document::new("arrivee", HEADING_SCENARIO).unwrap();
    let prediction = predictor.predict(&doc);
    assert!(prediction.iter().all(|(_, label)| label.is_end_line()));

    let wrapped = Document::new("fromage", WRAPPED_SCENARIO).unwrap();
    let prediction = predictor.predict(&wrapped);
    assert_eq!(prediction.space_offsets(), vec![10]);
}

#[test]
fn test_blank_separated_paragraphs_are_rule_resolved() {
    let outcome = train(&documents(&[("blank", BLANK_SEPARATED)]), &EndLinesConfig::default())
        .expect("Rule-only corpus still trains");
    let summary = outcome.model.summary();
    assert_eq!(summary.events, 5);
    assert_eq!(summary.rule_resolved, 5);
    assert_eq!(summary.fitted, 0);

    let predictor = Predictor::new(outcome.model).unwrap();
    let doc = Document::new("blank", BLANK_SEPARATED).unwrap();
    let prediction = predictor.predict(&doc);
    assert_eq!(prediction.len(), 5);
    for (offset, label) in prediction.iter() {
        assert_eq!(label.kind, BreakKind::EndLine, "newline at {offset}");
        assert!(matches!(label.source, LabelSource::Rule(_)), "newline at {offset}");
    }
}

/// Identical line lengths give the mixture nothing to separate
#[test]
fn test_equal_length_lines_fall_back_to_cues() {
    let text = "abcdefghijklmnopqrst\n".repeat(6);
    let outcome = train(&documents(&[("uniform", text.as_str())]), &EndLinesConfig::default()).unwrap();
    assert_eq!(
        outcome.model.length_model(),
        &LengthModel::Flat {
            reason: FlatReason::NoVariance
        }
    );

    let predictor = Predictor::new(outcome.model).unwrap();
    let prediction = predictor.predict(&Document::new("uniform", text.as_str()).unwrap());
    assert_eq!(prediction.len(), 6);
    assert_eq!(prediction.space_offsets(), vec![20, 41, 62, 83, 104]);
    assert_eq!(prediction.end_line_offsets(), vec![125]);
}

/// A few columns of raggedness is not a second layout
#[test]
fn test_ragged_paragraph_with_digit_led_wrap() {
    let predictor = trained_predictor(&[("posologie", RAGGED_PARAGRAPH)], &EndLinesConfig::default());
    assert_eq!(
        predictor.model().length_model(),
        &LengthModel::Flat {
            reason: FlatReason::NotSeparated
        }
    );

    let doc = Document::new("posologie", RAGGED_PARAGRAPH).unwrap();
    let prediction = predictor.predict(&doc);
    assert_eq!(prediction.len(), 6);
    assert_eq!(prediction.is_end_line(newline_after(RAGGED_PARAGRAPH, "renale et")), Some(false));
    assert_eq!(prediction.end_line_offsets(), vec![newline_after(RAGGED_PARAGRAPH, "le matin.")]);
}

/// Equal-width lines then one short closing line: only the last newline ends the paragraph
#[test]
fn test_uniform_width_paragraph_with_capitalised_wrap() {
    let predictor = trained_predictor(
        &[("transfert", UNIFORM_WIDTH_PARAGRAPH)],
        &EndLinesConfig::default(),
    );
    assert_eq!(
        predictor.model().length_model(),
        &LengthModel::Flat {
            reason: FlatReason::NoVariance
        }
    );

    let doc = Document::new("transfert", UNIFORM_WIDTH_PARAGRAPH).unwrap();
    let prediction = predictor.predict(&doc);
    let before_surname = newline_after(UNIFORM_WIDTH_PARAGRAPH, "le docteur");
    assert_eq!(before_surname, 79);
    assert_eq!(prediction.get(before_surname).unwrap().kind, BreakKind::Space);
    assert_eq!(prediction.get(before_surname).unwrap().source, LabelSource::Model);
    assert_eq!(prediction.space_offsets(), vec![39, 79, 119, 159]);
    assert_eq!(prediction.end_line_offsets(), vec![178]);
}

/// A wrap before a capitalised proper noun stays a space when lengths are measured corpus-wide
#[test]
fn test_corpus_scope_on_mixed_layout() {
    let mut config = EndLinesConfig::default();
    config.features.scope = NormalizationScope::Corpus;
    let predictor = trained_predictor(&training_notes(), &config);
    assert_eq!(predictor.model().normalization().corpus_median, 57.0);

    let doc = Document::new("antecedents", HISTORY_NOTE).unwrap();
    let prediction = predictor.predict(&doc);

    let expected = [
        ("ANTECEDENTS", BreakKind::EndLine),
        ("annees", BreakKind::Space),
        ("l'hopital", BreakKind::Space),
        ("observance.", BreakKind::EndLine),
        ("sevre", BreakKind::EndLine),
        ("dyslipidemie", BreakKind::EndLine),
    ];
    let expected: Vec<_> = expected
        .iter()
        .map(|(line_end, kind)| (newline_after(HISTORY_NOTE, line_end), *kind))
        .collect();
    assert_labels(&prediction, HISTORY_NOTE, &expected);
}

#[test]
fn test_prediction_is_idempotent_and_batch_preserves_order() {
    let notes = training_notes();
    let predictor = trained_predictor(&notes, &EndLinesConfig::default());
    let docs = documents(&notes);

    let first = predictor.predict(&docs[0]);
    let second = predictor.predict(&docs[0]);
    assert_eq!(first, second);

    let batch = predictor.predict_batch(&docs);
    assert_eq!(batch.len(), docs.len());
    for (doc, prediction) in docs.iter().zip(&batch) {
        assert_eq!(prediction.document_id, doc.id());
        assert_eq!(prediction, &predictor.predict(doc));
    }
}

#[test]
fn test_fit_is_reproducible_for_a_seed() {
    let docs = documents(&training_notes());
    let config = EndLinesConfig::default();

    let first = train(&docs, &config).unwrap().model;
    let second = train(&docs, &config).unwrap().model;
    assert_eq!(first, second);
}

/// Only the newlines the host hands over are labelled
#[test]
fn test_host_offsets_limit_the_prediction() {
    let predictor = trained_predictor(&training_notes(), &EndLinesConfig::default());

    let wrap = newline_after(ADMISSION_NOTE, "apparue");
    let paragraph_end = newline_after(ADMISSION_NOTE, "sublinguale.");
    let doc = Document::with_newlines("partial", ADMISSION_NOTE, vec![wrap, paragraph_end]).unwrap();

    let prediction = predictor.predict(&doc);
    assert_eq!(prediction.len(), 2);
    assert_eq!(prediction.is_end_line(wrap), Some(false));
    assert_eq!(prediction.is_end_line(paragraph_end), Some(true));
}
