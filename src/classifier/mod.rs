// WHY: fit/predict lifecycle of the unsupervised end-of-line model
// A ClassifierModel value only exists fully fitted; "untrained" is the absence of a model

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{EndLinesError, Result};
use crate::features::{FeatureConfig, FeatureVector};
use crate::label::Label;

pub mod decision;
pub mod mixture;

pub use decision::{AssignmentRule, DecisionConfig, LabelConvention, LengthEvidence};
pub use mixture::{EmSettings, GaussianComponent, Mixture};

/// Lower bound on `FitConfig::min_events`; two clusters need at least two events
pub const MIN_EVENTS_FLOOR: usize = 2;

/// Controls for fitting the length mixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub max_iterations: usize,
    /// Largest parameter change that counts as converged
    pub tolerance: f64,
    pub variance_floor: f64,
    /// Below this ratio variance length carries no signal
    pub min_variance: f64,
    /// Smallest gap between the fitted means, in length ratio units, that counts as two layouts
    pub min_mean_gap: f64,
    /// Newline events required in the corpus
    pub min_events: usize,
    /// Non-overridden events required to fit the mixture
    pub min_mixture_samples: usize,
    /// Seed of the initial jitter
    pub seed: u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-6,
            variance_floor: 1e-4,
            min_variance: 1e-6,
            min_mean_gap: 0.15,
            min_events: MIN_EVENTS_FLOOR,
            min_mixture_samples: 4,
            seed: 42,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(EndLinesError::Config("fit.max_iterations must be at least 1".into()));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(EndLinesError::Config(format!(
                "fit.tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(self.variance_floor.is_finite() && self.variance_floor > 0.0) {
            return Err(EndLinesError::Config(format!(
                "fit.variance_floor must be positive, got {}",
                self.variance_floor
            )));
        }
        if !(self.min_variance.is_finite() && self.min_variance >= 0.0) {
            return Err(EndLinesError::Config(format!(
                "fit.min_variance must be non-negative, got {}",
                self.min_variance
            )));
        }
        if !(self.min_mean_gap.is_finite() && self.min_mean_gap >= 0.0) {
            return Err(EndLinesError::Config(format!(
                "fit.min_mean_gap must be non-negative, got {}",
                self.min_mean_gap
            )));
        }
        if self.min_events < MIN_EVENTS_FLOOR {
            return Err(EndLinesError::Config(format!(
                "fit.min_events must be at least {MIN_EVENTS_FLOOR}, got {}",
                self.min_events
            )));
        }
        if self.min_mixture_samples < 2 {
            return Err(EndLinesError::Config(format!(
                "fit.min_mixture_samples must be at least 2, got {}",
                self.min_mixture_samples
            )));
        }
        Ok(())
    }

    fn em_settings(&self) -> EmSettings {
        EmSettings {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            variance_floor: self.variance_floor,
            seed: self.seed,
        }
    }
}

/// Why length was left out of the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatReason {
    TooFewSamples,
    NoVariance,
    Collapsed,
    /// The fitted means sit closer than `FitConfig::min_mean_gap`
    NotSeparated,
    /// Neither component carries more cues than the other
    NoCueContrast,
}

impl FlatReason {
    /// The fitted lines share one width, which is how wrapped text looks
    pub fn is_uniform_width(self) -> bool {
        matches!(self, FlatReason::NoVariance | FlatReason::NotSeparated)
    }
}

/// Statistical part of the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LengthModel {
    Mixture {
        mixture: Mixture,
        convention: LabelConvention,
    },
    /// Length carries no signal; only cues and rules decide
    Flat { reason: FlatReason },
}

/// Constants needed to rebuild features exactly as during training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub features: FeatureConfig,
    /// Median line length of the training corpus
    pub corpus_median: f64,
}

/// Bookkeeping about the fit, kept for inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub events: usize,
    pub rule_resolved: usize,
    pub fitted: usize,
    pub iterations: usize,
    pub converged: bool,
    pub log_likelihood: Option<f64>,
}

/// Fitted end-of-line classifier
///
/// Immutable once built; share it between threads by reference or `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierModel {
    length: LengthModel,
    normalization: Normalization,
    decision: DecisionConfig,
    summary: FitSummary,
}

impl ClassifierModel {
    pub fn length_model(&self) -> &LengthModel {
        &self.length
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    pub fn decision(&self) -> &DecisionConfig {
        &self.decision
    }

    pub fn summary(&self) -> &FitSummary {
        &self.summary
    }

    /// Label one newline: rule overrides first, then the adjusted mixture posterior
    pub fn classify(&self, features: &FeatureVector) -> Label {
        if let Some(rule) = features.rule_override() {
            return Label::from_rule(rule);
        }

        let length = match &self.length {
            LengthModel::Mixture { mixture, convention } => {
                LengthEvidence::Posterior(convention.end_line_posterior(mixture, features.length_ratio))
            }
            LengthModel::Flat { reason } if reason.is_uniform_width() => LengthEvidence::UniformWidth,
            LengthModel::Flat { .. } => LengthEvidence::Absent,
        };
        let p_end = self.decision.end_line_probability(length, features);
        Label::from_probability(p_end, self.decision.threshold)
    }

    /// One label per feature vector, in order
    pub fn classify_all(&self, features: &[FeatureVector]) -> Vec<Label> {
        features.iter().map(|f| self.classify(f)).collect()
    }

    /// Consistency checks applied to loaded models
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let LengthModel::Mixture { mixture, convention } = &self.length {
            mixture.validate()?;
            if convention.end_line_component > 1 {
                return Err(format!(
                    "end_line_component must be 0 or 1, got {}",
                    convention.end_line_component
                ));
            }
        }
        let median = self.normalization.corpus_median;
        if !(median.is_finite() && median >= 0.0) {
            return Err(format!("corpus_median must be a non-negative number, got {median}"));
        }
        self.normalization.features.validate().map_err(|e| e.to_string())?;
        self.decision.validate().map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Fit a model over the feature vectors of a corpus
///
/// Rule-resolved events are excluded from the mixture. If the remaining
/// lengths carry no usable variance the model falls back to a flat length model.
pub fn fit(
    samples: &[FeatureVector],
    normalization: Normalization,
    config: &FitConfig,
    decision: &DecisionConfig,
) -> Result<ClassifierModel> {
    config.validate()?;
    decision.validate()?;
    normalization.features.validate()?;

    if samples.len() < config.min_events {
        return Err(EndLinesError::InsufficientData {
            found: samples.len(),
            required: config.min_events,
        });
    }

    let statistical: Vec<FeatureVector> = samples
        .iter()
        .filter(|f| f.rule_override().is_none())
        .copied()
        .collect();
    let ratios: Vec<f64> = statistical.iter().map(|f| f.length_ratio).collect();

    debug!(
        events = samples.len(),
        statistical = statistical.len(),
        "Fitting end-of-line model"
    );

    let mut summary = FitSummary {
        events: samples.len(),
        rule_resolved: samples.len() - statistical.len(),
        fitted: 0,
        iterations: 0,
        converged: false,
        log_likelihood: None,
    };

    let length = if ratios.len() < config.min_mixture_samples {
        flat(FlatReason::TooFewSamples, ratios.len())
    } else if mixture::mean_variance(&ratios).1 < config.min_variance {
        flat(FlatReason::NoVariance, ratios.len())
    } else {
        match mixture::fit_em(&ratios, &config.em_settings()) {
            Ok(outcome) => fitted_length_model(outcome, &statistical, config, &mut summary),
            Err(mixture::Collapsed) => flat(FlatReason::Collapsed, ratios.len()),
        }
    };

    Ok(ClassifierModel {
        length,
        normalization,
        decision: decision.clone(),
        summary,
    })
}

/// Keep a converged mixture only when its clusters mean two layouts that cues can name
fn fitted_length_model(
    outcome: mixture::EmOutcome,
    statistical: &[FeatureVector],
    config: &FitConfig,
    summary: &mut FitSummary,
) -> LengthModel {
    let gap = mean_gap(&outcome.mixture);
    if gap < config.min_mean_gap {
        debug!(gap, min_mean_gap = config.min_mean_gap, "Length clusters are not separated");
        return flat(FlatReason::NotSeparated, statistical.len());
    }
    let Some(convention) = LabelConvention::assign(&outcome.responsibilities, statistical) else {
        return flat(FlatReason::NoCueContrast, statistical.len());
    };

    let [short, long] = outcome.mixture.components;
    info!(
        iterations = outcome.iterations,
        converged = outcome.converged,
        log_likelihood = outcome.log_likelihood,
        short_mean = short.mean,
        short_weight = short.weight,
        long_mean = long.mean,
        long_weight = long.weight,
        end_line_component = convention.end_line_component,
        rule = ?convention.rule,
        "Length mixture fitted"
    );
    if !outcome.converged {
        warn!(
            max_iterations = config.max_iterations,
            "Length mixture stopped at the iteration cap before converging"
        );
    }
    summary.fitted = statistical.len();
    summary.iterations = outcome.iterations;
    summary.converged = outcome.converged;
    summary.log_likelihood = Some(outcome.log_likelihood);
    LengthModel::Mixture {
        mixture: outcome.mixture,
        convention,
    }
}

fn mean_gap(mixture: &Mixture) -> f64 {
    let [short, long] = mixture.components;
    long.mean - short.mean
}

fn flat(reason: FlatReason, samples: usize) -> LengthModel {
    warn!(?reason, samples, "Length carries no usable signal, using cues and rules only");
    LengthModel::Flat { reason }
}
