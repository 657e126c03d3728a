use diabcare::catalog::FoodCatalog;
use diabcare::config::AppConfig;
use diabcare::error::AppError;
use diabcare::history::{
    LogError, PredictionLog, PredictionRecord, RecommendationLog, RecommendationRecord,
};
use diabcare::prediction::{LinearSuitabilityModel, LogisticRiskClassifier, RiskClassifier};
use diabcare::recommendation::{GiThresholds, RecommendationEngine, ScoringEngine};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Records kept per in-memory history log before the oldest are dropped.
const HISTORY_CAPACITY: usize = 10_000;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) classifier: Option<Arc<dyn RiskClassifier>>,
    pub(crate) predictions: Arc<InMemoryPredictionLog>,
    pub(crate) thresholds: GiThresholds,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRecommendationLog {
    records: Arc<Mutex<VecDeque<RecommendationRecord>>>,
}

impl RecommendationLog for InMemoryRecommendationLog {
    fn append(&self, record: RecommendationRecord) -> Result<(), LogError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| LogError::Unavailable("recommendation log mutex poisoned".to_string()))?;
        push_bounded(&mut guard, record);
        Ok(())
    }
}

#[cfg(test)]
impl InMemoryRecommendationLog {
    pub(crate) fn records(&self) -> Vec<RecommendationRecord> {
        self.records
            .lock()
            .expect("recommendation log mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPredictionLog {
    records: Arc<Mutex<VecDeque<PredictionRecord>>>,
}

impl PredictionLog for InMemoryPredictionLog {
    fn append(&self, record: PredictionRecord) -> Result<(), LogError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| LogError::Unavailable("prediction log mutex poisoned".to_string()))?;
        push_bounded(&mut guard, record);
        Ok(())
    }
}

#[cfg(test)]
impl InMemoryPredictionLog {
    pub(crate) fn records(&self) -> Vec<PredictionRecord> {
        self.records
            .lock()
            .expect("prediction log mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

fn push_bounded<T>(records: &mut VecDeque<T>, record: T) {
    if records.len() == HISTORY_CAPACITY {
        records.pop_front();
    }
    records.push_back(record);
}

/// Engine plus the classifier it was built with, shared by the server and the CLI.
pub(crate) struct Components {
    pub(crate) engine: RecommendationEngine,
    pub(crate) classifier: Option<Arc<dyn RiskClassifier>>,
}

/// Loads the catalog (fatal on failure) and the optional model artifacts (skipped with a
/// warning when they cannot be read).
pub(crate) fn build_components(config: &AppConfig) -> Result<Components, AppError> {
    let catalog = Arc::new(FoodCatalog::from_path(&config.models.food_csv)?);
    info!(
        items = catalog.len(),
        categories = catalog.categories().len(),
        "catalog ready"
    );

    let classifier = config
        .models
        .classifier_path
        .as_ref()
        .and_then(|path| match LogisticRiskClassifier::from_path(path) {
            Ok(classifier) => Some(Arc::new(classifier) as Arc<dyn RiskClassifier>),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "risk classifier not loaded");
                None
            }
        });

    let scoring = match config.models.suitability_model_path.as_ref() {
        Some(path) => match LinearSuitabilityModel::from_path(path) {
            Ok(model) => ScoringEngine::with_model(Arc::new(model)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "suitability model not loaded; using rules");
                ScoringEngine::rule_based()
            }
        },
        None => ScoringEngine::rule_based(),
    };

    let mut engine =
        RecommendationEngine::new(catalog, config.recommendation.clone()).with_scoring(scoring);
    if let Some(classifier) = &classifier {
        engine = engine.with_classifier(Arc::clone(classifier));
    }

    Ok(Components { engine, classifier })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use diabcare::profile::HealthProfile;
    use diabcare::recommendation::RiskTier;

    fn record(count: usize) -> RecommendationRecord {
        RecommendationRecord {
            profile: HealthProfile::new(30.0, 24.0, 95.0, 9.0).expect("valid profile"),
            risk_tier: RiskTier::Low,
            category: "Buah".to_string(),
            recommendations_count: count,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn recommendation_log_keeps_the_newest_records() {
        let log = InMemoryRecommendationLog::default();
        for count in 0..HISTORY_CAPACITY + 2 {
            log.append(record(count)).expect("append");
        }
        let records = log.records();
        assert_eq!(records.len(), HISTORY_CAPACITY);
        assert_eq!(records[0].recommendations_count, 2);
        assert_eq!(
            records.last().map(|r| r.recommendations_count),
            Some(HISTORY_CAPACITY + 1)
        );
    }
}
