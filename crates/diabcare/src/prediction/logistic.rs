use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::features::{FeatureVector, DEFAULT_FEATURE_ORDER};
use super::{ModelError, RiskClassifier, RiskPrediction};
use crate::profile::HealthProfile;

/// Per-feature standardisation: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelError> {
        if mean.len() != scale.len() {
            return Err(ModelError::Shape {
                what: "scaler scale",
                expected: mean.len(),
                actual: scale.len(),
            });
        }
        Ok(Self { mean, scale })
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        if features.len() != self.mean.len() {
            return Err(ModelError::Shape {
                what: "scaler",
                expected: self.mean.len(),
                actual: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(value, (mean, scale))| {
                // zero variance columns pass through centred, not divided
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (value - mean) / scale
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ClassifierArtifact {
    #[serde(default)]
    feature_order: Option<Vec<String>>,
    #[serde(default)]
    scaler: Option<StandardScaler>,
    coefficients: Vec<f64>,
    intercept: f64,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

/// Logistic regression over a scaled, ordered feature vector.
#[derive(Debug, Clone)]
pub struct LogisticRiskClassifier {
    feature_order: Vec<String>,
    scaler: Option<StandardScaler>,
    coefficients: Vec<f64>,
    intercept: f64,
    threshold: f64,
}

impl LogisticRiskClassifier {
    pub fn new(
        feature_order: Vec<String>,
        scaler: Option<StandardScaler>,
        coefficients: Vec<f64>,
        intercept: f64,
        threshold: f64,
    ) -> Result<Self, ModelError> {
        if let Some(unknown) = feature_order
            .iter()
            .find(|name| !FeatureVector::is_known(name))
        {
            return Err(ModelError::UnknownFeature(unknown.clone()));
        }
        if coefficients.len() != feature_order.len() {
            return Err(ModelError::Shape {
                what: "coefficients",
                expected: feature_order.len(),
                actual: coefficients.len(),
            });
        }
        if let Some(scaler) = &scaler {
            if scaler.len() != feature_order.len() {
                return Err(ModelError::Shape {
                    what: "scaler",
                    expected: feature_order.len(),
                    actual: scaler.len(),
                });
            }
        }
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(ModelError::Unavailable(format!(
                "decision threshold {threshold} outside (0, 1)"
            )));
        }

        Ok(Self {
            feature_order,
            scaler,
            coefficients,
            intercept,
            threshold,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let file = std::fs::File::open(path.as_ref())?;
        let classifier = Self::from_reader(file)?;
        info!(
            path = %path.as_ref().display(),
            features = ?classifier.feature_order,
            "risk classifier loaded"
        );
        Ok(classifier)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelError> {
        let artifact: ClassifierArtifact = serde_json::from_reader(reader)?;
        let feature_order = artifact.feature_order.unwrap_or_else(|| {
            DEFAULT_FEATURE_ORDER
                .iter()
                .map(|name| name.to_string())
                .collect()
        });
        Self::new(
            feature_order,
            artifact.scaler,
            artifact.coefficients,
            artifact.intercept,
            artifact.threshold,
        )
    }

    pub fn feature_order(&self) -> &[String] {
        &self.feature_order
    }
}

impl RiskClassifier for LogisticRiskClassifier {
    fn predict(&self, profile: &HealthProfile) -> Result<RiskPrediction, ModelError> {
        let features = FeatureVector::from_profile(profile).ordered(&self.feature_order)?;
        let scaled = match &self.scaler {
            Some(scaler) => scaler.transform(&features)?,
            None => features.clone(),
        };

        let logit = self.intercept
            + scaled
                .iter()
                .zip(&self.coefficients)
                .map(|(value, weight)| value * weight)
                .sum::<f64>();
        let probability = 1.0 / (1.0 + (-logit).exp());
        if !probability.is_finite() {
            return Err(ModelError::NonFinite("probability"));
        }

        Ok(RiskPrediction {
            label: u8::from(probability >= self.threshold),
            probability,
            feature_order: self.feature_order.clone(),
            features,
            scaled_features: scaled,
        })
    }
}
