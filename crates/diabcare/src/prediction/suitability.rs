use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::ModelError;
use crate::catalog::NutrientVector;
use crate::profile::HealthProfile;
use crate::recommendation::SuitabilityModel;

/// Width of the combined input: four user measurements then seven nutrients.
const INPUT_WIDTH: usize = 11;

#[derive(Debug, Deserialize)]
struct SuitabilityArtifact {
    weights: Vec<f64>,
    #[serde(default)]
    bias: f64,
    #[serde(default)]
    sigmoid: bool,
}

/// Linear suitability model over `[age, bmi, glucose, insulin, gi, calories, carbs, protein,
/// fat, fiber, sodium]`. With `sigmoid` set it reports a probability; otherwise the raw
/// response, which the scoring engine normalises.
#[derive(Debug, Clone)]
pub struct LinearSuitabilityModel {
    weights: Vec<f64>,
    bias: f64,
    sigmoid: bool,
}

impl LinearSuitabilityModel {
    pub fn new(weights: Vec<f64>, bias: f64, sigmoid: bool) -> Result<Self, ModelError> {
        if weights.len() != INPUT_WIDTH {
            return Err(ModelError::Shape {
                what: "suitability weights",
                expected: INPUT_WIDTH,
                actual: weights.len(),
            });
        }
        Ok(Self {
            weights,
            bias,
            sigmoid,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let file = std::fs::File::open(path.as_ref())?;
        let model = Self::from_reader(file)?;
        info!(path = %path.as_ref().display(), "suitability model loaded");
        Ok(model)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelError> {
        let artifact: SuitabilityArtifact = serde_json::from_reader(reader)?;
        Self::new(artifact.weights, artifact.bias, artifact.sigmoid)
    }
}

impl SuitabilityModel for LinearSuitabilityModel {
    fn name(&self) -> &str {
        "linear_suitability"
    }

    fn score(&self, profile: &HealthProfile, nutrients: &NutrientVector) -> Result<f64, ModelError> {
        let inputs = profile.as_array().into_iter().chain(nutrients.as_array());
        let response = self.bias
            + inputs
                .zip(&self.weights)
                .map(|(value, weight)| value * weight)
                .sum::<f64>();

        let output = if self.sigmoid {
            1.0 / (1.0 + (-response).exp())
        } else {
            response
        };

        if output.is_finite() {
            Ok(output)
        } else {
            Err(ModelError::NonFinite("suitability score"))
        }
    }
}
