//! Food recommendation pipeline: risk tier, GI filter, scoring, seeded sampling and formatting.

mod engine;
mod filter;
mod risk;
mod router;
mod sampler;
mod scoring;
mod seed;
mod service;

#[cfg(test)]
mod tests;

pub use engine::{
    Diagnostics, FailureContext, GiRange, Recommendation, RecommendationEngine,
    RecommendationError, RecommendationRequest, RecommendationResponse, RecommendationStage,
};
pub use filter::{filter_by_tier, EmptyAfterFilter, FilterOutcome, GiCategory, GiThresholds};
pub use risk::{assess_by_rules, risk_points, RiskAssessment, RiskSource, RiskTier};
pub use router::recommendation_router;
pub use sampler::{weight_for, GlycemicWeighted, Sample, WeightedSampler};
pub use scoring::{
    profile_jitter, rule_based_score, ScoreOutcome, ScoringEngine, ScoringMethod,
    ScoringStrategy, SuitabilityModel,
};
pub use seed::{derive_seed, seed_input, TimeBucket};
pub use service::RecommendationService;

use serde::Serialize;

/// Immutable engine settings, built once from [`crate::config::AppConfig`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationConfig {
    pub thresholds: GiThresholds,
    pub default_top_n: usize,
    pub max_top_n: usize,
    /// Fixed offset used for the hourly seed bucket.
    pub utc_offset_hours: i32,
    pub risk_source: RiskSource,
    pub pool_multiplier: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            thresholds: GiThresholds::default(),
            default_top_n: 5,
            max_top_n: 25,
            utc_offset_hours: 7,
            risk_source: RiskSource::Rules,
            pool_multiplier: 3,
        }
    }
}
