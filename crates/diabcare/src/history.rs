//! Append-only history records emitted after predictions and recommendations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::profile::HealthProfile;
use crate::recommendation::RiskTier;

/// Summary of one served recommendation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRecord {
    pub profile: HealthProfile,
    pub risk_tier: RiskTier,
    pub category: String,
    pub recommendations_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Classifier output stored for later review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub profile: HealthProfile,
    pub label: u8,
    pub probability: f64,
    pub created_at: DateTime<Utc>,
}

/// Sink for recommendation history. Callers never wait on acknowledgement.
pub trait RecommendationLog: Send + Sync {
    fn append(&self, record: RecommendationRecord) -> Result<(), LogError>;
}

/// Sink for prediction history.
pub trait PredictionLog: Send + Sync {
    fn append(&self, record: PredictionRecord) -> Result<(), LogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("history log unavailable: {0}")]
    Unavailable(String),
}
