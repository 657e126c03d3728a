use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::engine::{
    RecommendationEngine, RecommendationError, RecommendationRequest, RecommendationResponse,
};
use super::risk::RiskTier;
use crate::catalog::CategorySummary;
use crate::history::{RecommendationLog, RecommendationRecord};

/// Service composing the recommendation engine with the history log.
pub struct RecommendationService<L> {
    engine: Arc<RecommendationEngine>,
    log: Arc<L>,
}

impl<L> RecommendationService<L>
where
    L: RecommendationLog + 'static,
{
    pub fn new(engine: Arc<RecommendationEngine>, log: Arc<L>) -> Self {
        Self { engine, log }
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    pub fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> Result<RecommendationResponse, RecommendationError> {
        self.recommend_at(request, Utc::now())
    }

    /// Serve a request as of `now`, appending a history record when a tier was determined.
    ///
    /// History failures are logged and never fail the request.
    pub fn recommend_at(
        &self,
        request: RecommendationRequest,
        now: DateTime<Utc>,
    ) -> Result<RecommendationResponse, RecommendationError> {
        let result = self.engine.recommend(&request, now);

        match &result {
            Ok(response) => {
                info!(
                    category = %request.category,
                    tier = response.risk_tier().label(),
                    seed = response.diagnostics.seed,
                    candidates = response.diagnostics.candidates_after_filter,
                    returned = response.recommendations.len(),
                    "recommendations served"
                );
                self.record(&request, response.risk_tier(), response.recommendations.len(), now);
            }
            Err(RecommendationError::EmptyAfterFilter(context)) => {
                info!(
                    category = %request.category,
                    candidates = context.candidates_in_category,
                    "no foods passed the glycemic filter"
                );
                if let Some(tier) = context.risk_tier {
                    self.record(&request, tier, 0, now);
                }
            }
            Err(error) => {
                info!(category = %request.category, error = %error, "recommendation rejected");
            }
        }

        result
    }

    pub fn categories(&self) -> Vec<CategorySummary> {
        self.engine.catalog().categories()
    }

    fn record(
        &self,
        request: &RecommendationRequest,
        tier: RiskTier,
        count: usize,
        now: DateTime<Utc>,
    ) {
        let record = RecommendationRecord {
            profile: request.profile,
            risk_tier: tier,
            category: request.category.clone(),
            recommendations_count: count,
            created_at: now,
        };
        if let Err(error) = self.log.append(record) {
            warn!(error = %error, "failed to append recommendation history");
        }
    }
}
