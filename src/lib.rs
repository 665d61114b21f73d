pub mod classifier;
pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod features;
pub mod label;
pub mod predictor;
pub mod reader;
pub mod report;
pub mod store;
pub mod training;

// Re-export main types for convenient access
pub use classifier::{fit, ClassifierModel, DecisionConfig, FitConfig, LengthModel, Normalization};
pub use config::EndLinesConfig;
pub use document::{Document, LineBreakEvent};
pub use error::{EndLinesError, Result};
pub use features::{FeatureConfig, FeatureExtractor, FeatureVector, NormalizationScope};
pub use label::{BreakKind, Label, LabelSource, RuleOverride};
pub use predictor::{predict, Prediction, Predictor};
pub use report::Report;
pub use store::{load, save};
pub use training::{train, TrainingOutcome};
