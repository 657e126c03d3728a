//! Per-item suitability scoring with a rule table and an optional pluggable model.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::catalog::NutrientVector;
use crate::prediction::ModelError;
use crate::profile::HealthProfile;

/// External scorer mapping a profile and a food's nutrients to a raw suitability value.
///
/// The raw value may be a probability in `[0, 1]` or a percentage; [`ScoringEngine`]
/// normalises it either way.
pub trait SuitabilityModel: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, profile: &HealthProfile, nutrients: &NutrientVector)
        -> Result<f64, ModelError>;
}

/// Which scorer produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    RuleBased,
    SuitabilityModel,
}

impl ScoringMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMethod::RuleBased => "rule_based",
            ScoringMethod::SuitabilityModel => "suitability_model",
        }
    }
}

#[derive(Clone)]
pub enum ScoringStrategy {
    RuleBased,
    Model(Arc<dyn SuitabilityModel>),
}

impl fmt::Debug for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringStrategy::RuleBased => f.write_str("RuleBased"),
            ScoringStrategy::Model(model) => f.debug_tuple("Model").field(&model.name()).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreOutcome {
    pub score: f64,
    pub method: ScoringMethod,
    /// The model was configured but failed, so the rule table produced this score.
    pub fell_back: bool,
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    strategy: ScoringStrategy,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::rule_based()
    }
}

impl ScoringEngine {
    pub fn new(strategy: ScoringStrategy) -> Self {
        Self { strategy }
    }

    pub fn rule_based() -> Self {
        Self::new(ScoringStrategy::RuleBased)
    }

    pub fn with_model(model: Arc<dyn SuitabilityModel>) -> Self {
        Self::new(ScoringStrategy::Model(model))
    }

    pub fn strategy(&self) -> &ScoringStrategy {
        &self.strategy
    }

    /// Scores one item. Model failures fall back to the rule table and never surface.
    pub fn score(
        &self,
        profile: &HealthProfile,
        nutrients: &NutrientVector,
        seed: u32,
    ) -> ScoreOutcome {
        let jitter = profile_jitter(profile, seed);

        if let ScoringStrategy::Model(model) = &self.strategy {
            match model
                .score(profile, nutrients)
                .and_then(normalize_model_output)
            {
                Ok(value) => {
                    return ScoreOutcome {
                        score: (0.8 * value + 0.2 * jitter).clamp(0.0, 1.0),
                        method: ScoringMethod::SuitabilityModel,
                        fell_back: false,
                    };
                }
                Err(error) => {
                    warn!(
                        model = model.name(),
                        error = %error,
                        "suitability model failed; using rule-based score"
                    );
                    return ScoreOutcome {
                        score: rule_based_score(profile, nutrients, jitter),
                        method: ScoringMethod::RuleBased,
                        fell_back: true,
                    };
                }
            }
        }

        ScoreOutcome {
            score: rule_based_score(profile, nutrients, jitter),
            method: ScoringMethod::RuleBased,
            fell_back: false,
        }
    }
}

fn normalize_model_output(raw: f64) -> Result<f64, ModelError> {
    if !raw.is_finite() {
        return Err(ModelError::NonFinite("suitability score"));
    }
    let value = if raw > 1.0 { raw / 100.0 } else { raw };
    Ok(value.clamp(0.0, 1.0))
}

/// Deterministic value in `[0, 1)` from a cheap arithmetic hash of the profile and seed.
pub fn profile_jitter(profile: &HealthProfile, seed: u32) -> f64 {
    let mix = profile.age() * 0.01
        + profile.bmi() * 0.02
        + profile.glucose() * 0.001
        + profile.insulin() * 0.005
        + f64::from(seed) / 4_294_967_296.0;
    mix.fract()
}

/// Additive heuristics starting from 0.5, offset by `0.1 * jitter - 0.05`, clamped to `[0, 1]`.
pub fn rule_based_score(profile: &HealthProfile, food: &NutrientVector, jitter: f64) -> f64 {
    let gi = food.glycemic_index;
    let mut score = 0.5;

    let age = profile.age();
    if age > 50.0 {
        score += bonus(gi <= 35.0, 0.25) + bonus(food.fiber >= 3.0, 0.15);
        score += bonus(food.sodium <= 100.0, 0.10);
    } else if age < 30.0 {
        score += bonus(food.protein >= 8.0, 0.20) + bonus(food.calories >= 100.0, 0.10);
    } else {
        score += bonus(gi <= 50.0, 0.15) + bonus(food.protein >= 5.0, 0.10);
    }

    let bmi = profile.bmi();
    if bmi > 25.0 {
        score += bonus(food.calories <= 80.0, 0.30) + bonus(food.fiber >= 4.0, 0.20);
        score += bonus(food.fat <= 3.0, 0.15);
    } else if bmi < 18.5 {
        score += bonus(food.calories >= 150.0, 0.25) + bonus(food.protein >= 10.0, 0.20);
        score += bonus(food.fat >= 5.0, 0.10);
    } else {
        score += bonus(gi <= 55.0, 0.15) + bonus(food.protein >= 6.0, 0.10);
    }

    let glucose = profile.glucose();
    if glucose > 126.0 {
        score += if gi <= 35.0 {
            0.40
        } else if gi <= 50.0 {
            0.20
        } else {
            -0.30
        };
        score += bonus(food.fiber >= 5.0, 0.25) + bonus(food.carbohydrates <= 10.0, 0.20);
    } else if glucose > 100.0 {
        score += bonus(gi <= 50.0, 0.25) - bonus(gi > 70.0, 0.15);
        score += bonus(food.fiber >= 3.0, 0.15);
    } else {
        score += bonus(gi <= 60.0, 0.10);
    }

    let insulin = profile.insulin();
    if insulin > 20.0 {
        score += bonus(gi <= 35.0, 0.30) + bonus(food.fiber >= 4.0, 0.20);
        score += bonus(food.carbohydrates <= 15.0, 0.15);
    } else if insulin < 5.0 {
        score += bonus(food.carbohydrates >= 20.0, 0.10) + bonus(food.protein >= 8.0, 0.15);
    }

    score += 0.1 * jitter - 0.05;
    score.clamp(0.0, 1.0)
}

fn bonus(condition: bool, amount: f64) -> f64 {
    if condition {
        amount
    } else {
        0.0
    }
}
