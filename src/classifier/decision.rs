// WHY: the mixture only sees line lengths; categorical cues enter here as a logistic adjustment
// of the mixture posterior so the statistical core stays one-dimensional

use serde::{Deserialize, Serialize};

use super::mixture::Mixture;
use crate::error::{EndLinesError, Result};
use crate::features::FeatureVector;

/// Weights of the logistic adjustment, in log-odds units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Multiplier on the log-odds of the length mixture
    pub length_weight: f64,
    /// Prior log-odds of a structural break
    pub bias: f64,
    pub terminal_weight: f64,
    pub upper_weight: f64,
    pub marker_weight: f64,
    pub heading_weight: f64,
    /// Subtracted when the next line starts lowercase
    pub lower_weight: f64,
    /// Subtracted when the line ends with a comma or hyphen
    pub continuation_weight: f64,
    /// Length term of a flat model whose lines all share one width
    pub uniform_width_bias: f64,
    /// Mixture posteriors are clamped to `[clamp, 1 - clamp]`
    pub probability_clamp: f64,
    /// `END_LINE` when the adjusted probability reaches this value
    pub threshold: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            length_weight: 1.0,
            bias: -0.5,
            terminal_weight: 2.0,
            upper_weight: 1.0,
            marker_weight: 1.5,
            heading_weight: 1.5,
            lower_weight: 2.0,
            continuation_weight: 1.0,
            uniform_width_bias: -0.75,
            probability_clamp: 0.1,
            threshold: 0.5,
        }
    }
}

impl DecisionConfig {
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("length_weight", self.length_weight),
            ("bias", self.bias),
            ("terminal_weight", self.terminal_weight),
            ("upper_weight", self.upper_weight),
            ("marker_weight", self.marker_weight),
            ("heading_weight", self.heading_weight),
            ("lower_weight", self.lower_weight),
            ("continuation_weight", self.continuation_weight),
            ("uniform_width_bias", self.uniform_width_bias),
        ];
        if let Some((name, value)) = weights.iter().find(|(_, v)| !v.is_finite()) {
            return Err(EndLinesError::Config(format!("decision.{name} must be finite, got {value}")));
        }
        if !(self.probability_clamp > 0.0 && self.probability_clamp < 0.5) {
            return Err(EndLinesError::Config(format!(
                "decision.probability_clamp must be within (0, 0.5), got {}",
                self.probability_clamp
            )));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(EndLinesError::Config(format!(
                "decision.threshold must be within (0, 1), got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Probability of `END_LINE` given what the length model says about this newline
    pub fn end_line_probability(&self, length: LengthEvidence, features: &FeatureVector) -> f64 {
        let length_term = match length {
            LengthEvidence::Posterior(p) => {
                let p = p.clamp(self.probability_clamp, 1.0 - self.probability_clamp);
                self.length_weight * logit(p)
            }
            LengthEvidence::UniformWidth => self.uniform_width_bias,
            LengthEvidence::Absent => 0.0,
        };

        let mut z = length_term + self.bias;
        if features.prev_ends_terminal {
            z += self.terminal_weight;
        }
        if features.next_starts_upper {
            z += self.upper_weight;
        }
        if features.next_starts_marker {
            z += self.marker_weight;
        }
        if features.prev_is_heading {
            z += self.heading_weight;
        }
        if features.next_starts_lower {
            z -= self.lower_weight;
        }
        if features.prev_ends_continuation {
            z -= self.continuation_weight;
        }
        sigmoid(z)
    }
}

/// Length term input of the decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LengthEvidence {
    /// Mixture posterior of the end-line component
    Posterior(f64),
    /// Every fitted line has about the same width, the layout of wrapped text
    UniformWidth,
    Absent,
}

/// How the end-line component was chosen after convergence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentRule {
    /// Most short-line members are followed by an uppercase line
    ShortLinesUppercaseFollow,
    /// The component with the larger share of punctuation or capitalisation cues
    StrongerStructuralCues,
}

/// Which mixture component means `END_LINE`, and the evidence for it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelConvention {
    /// Index into `Mixture::components`
    pub end_line_component: usize,
    pub rule: AssignmentRule,
    /// Weighted share of short-component members followed by an uppercase line
    pub short_upper_share: f64,
    /// Weighted share of members with a structural cue, per component
    pub cue_share: [f64; 2],
}

const CUE_SHARE_EPSILON: f64 = 1e-9;

impl LabelConvention {
    /// Decide the end-line component from the fitted responsibilities
    ///
    /// `None` when neither rule tells the components apart: the short component has
    /// no uppercase majority and both carry the same share of structural cues.
    pub fn assign(responsibilities: &[[f64; 2]], features: &[FeatureVector]) -> Option<Self> {
        let mut mass = [0.0f64; 2];
        let mut upper = [0.0f64; 2];
        let mut cues = [0.0f64; 2];

        for (r, f) in responsibilities.iter().zip(features) {
            for k in 0..2 {
                mass[k] += r[k];
                if f.next_starts_upper {
                    upper[k] += r[k];
                }
                if f.has_structural_cue() {
                    cues[k] += r[k];
                }
            }
        }

        let share = |num: f64, den: f64| if den > 0.0 { num / den } else { 0.0 };
        let short_upper_share = share(upper[0], mass[0]);
        let cue_share = [share(cues[0], mass[0]), share(cues[1], mass[1])];

        let (end_line_component, rule) = if short_upper_share >= 0.5 {
            (0, AssignmentRule::ShortLinesUppercaseFollow)
        } else if (cue_share[1] - cue_share[0]).abs() < CUE_SHARE_EPSILON {
            return None;
        } else if cue_share[1] > cue_share[0] {
            (1, AssignmentRule::StrongerStructuralCues)
        } else {
            (0, AssignmentRule::StrongerStructuralCues)
        };

        Some(Self {
            end_line_component,
            rule,
            short_upper_share,
            cue_share,
        })
    }

    /// Mixture posterior of the end-line component
    pub fn end_line_posterior(&self, mixture: &Mixture, length_ratio: f64) -> f64 {
        mixture.responsibilities(length_ratio)[self.end_line_component]
    }
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
