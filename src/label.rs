// WHY: labels are plain values returned to the host; the host decides how to attach them to its spans

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a single newline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakKind {
    /// Wrap artefact, equivalent to a space
    Space,
    /// Structural boundary
    EndLine,
}

impl BreakKind {
    pub fn is_end_line(self) -> bool {
        matches!(self, BreakKind::EndLine)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BreakKind::Space => "SPACE",
            BreakKind::EndLine => "END_LINE",
        }
    }
}

impl fmt::Display for BreakKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic that decides a newline before the statistical model is consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOverride {
    /// Nothing but whitespace follows the newline
    DocumentEnd,
    /// The next line is blank, i.e. a paragraph separator starts here
    BlankLineFollows,
    /// The line before the newline is empty or almost only whitespace
    NearEmptyPrecedes,
}

impl RuleOverride {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleOverride::DocumentEnd => "document_end",
            RuleOverride::BlankLineFollows => "blank_line_follows",
            RuleOverride::NearEmptyPrecedes => "near_empty_precedes",
        }
    }
}

/// What produced a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "rule")]
pub enum LabelSource {
    Rule(RuleOverride),
    Model,
}

impl fmt::Display for LabelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelSource::Rule(rule) => write!(f, "rule:{}", rule.as_str()),
            LabelSource::Model => f.write_str("model"),
        }
    }
}

/// Label attached to exactly one newline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub kind: BreakKind,
    /// Probability of `kind` under the model, 1.0 for rule decisions
    pub confidence: f64,
    pub source: LabelSource,
}

impl Label {
    pub fn from_rule(rule: RuleOverride) -> Self {
        Self {
            kind: BreakKind::EndLine,
            confidence: 1.0,
            source: LabelSource::Rule(rule),
        }
    }

    /// Turn an end-line probability into a label with the given threshold
    pub fn from_probability(p_end: f64, threshold: f64) -> Self {
        if p_end >= threshold {
            Self {
                kind: BreakKind::EndLine,
                confidence: p_end,
                source: LabelSource::Model,
            }
        } else {
            Self {
                kind: BreakKind::Space,
                confidence: 1.0 - p_end,
                source: LabelSource::Model,
            }
        }
    }

    pub fn is_end_line(&self) -> bool {
        self.kind.is_end_line()
    }
}
