//! Pluggable statistical models: the diabetes risk classifier and the food suitability model.
//!
//! Both are loaded from JSON artifacts exported by the training pipeline, which lives outside
//! this repository.

mod features;
mod logistic;
mod suitability;

pub use features::{FeatureVector, DEFAULT_FEATURE_ORDER, ENGINEERED_FEATURE_ORDER};
pub use logistic::{LogisticRiskClassifier, StandardScaler};
pub use suitability::LinearSuitabilityModel;

use serde::Serialize;

use crate::profile::HealthProfile;

/// Binary diabetes risk classifier consuming features in a fixed order.
pub trait RiskClassifier: Send + Sync {
    fn predict(&self, profile: &HealthProfile) -> Result<RiskPrediction, ModelError>;
}

/// Classifier output including the feature trail for debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPrediction {
    pub label: u8,
    pub probability: f64,
    pub feature_order: Vec<String>,
    pub features: Vec<f64>,
    pub scaled_features: Vec<f64>,
}

impl RiskPrediction {
    pub fn is_positive(&self) -> bool {
        self.label == 1
    }
}

/// Failure to load or evaluate a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid model artifact: {0}")]
    Artifact(#[from] serde_json::Error),
    #[error("{what} expects {expected} values, got {actual}")]
    Shape {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("unknown feature '{0}'")]
    UnknownFeature(String),
    #[error("model produced a non-finite {0}")]
    NonFinite(&'static str),
    #[error("model unavailable: {0}")]
    Unavailable(String),
}
