use std::sync::{Arc, Mutex};

use axum::response::Response;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::catalog::{FoodCatalog, FoodItem, NutrientVector};
use crate::history::{LogError, RecommendationLog, RecommendationRecord};
use crate::prediction::{ModelError, RiskClassifier, RiskPrediction};
use crate::profile::HealthProfile;
use crate::recommendation::{
    recommendation_router, RecommendationConfig, RecommendationEngine, RecommendationService,
    SuitabilityModel,
};

pub(super) fn food(name: &str, category: &str, gi: Option<u16>, protein: f64) -> FoodItem {
    FoodItem {
        name: name.to_string(),
        category: category.to_string(),
        glycemic_index: gi,
        calories: 45.0,
        carbohydrates: 9.5,
        protein,
        fat: 0.3,
        fiber: 2.5,
        sodium: 3.0,
        sugar: 6.0,
        suitable_for_diabetes: gi.map(|value| value <= 55).unwrap_or(false),
    }
}

/// Buah: three items at GI ≤ 35, six at GI ≤ 50. Sayur: fifteen distinct names at GI ≤ 50
/// plus one duplicate name. Minuman manis: nothing at GI ≤ 50.
pub(super) fn catalog() -> Arc<FoodCatalog> {
    let mut items = vec![
        food("Ceri", "Buah", Some(22), 1.0),
        food("Jeruk Bali", "Buah", Some(25), 0.8),
        food("Pir", "Buah", Some(33), 0.4),
        food("Apel", "Buah", Some(36), 0.3),
        food("Jeruk", "Buah", Some(43), 0.9),
        food("Anggur", "Buah", Some(46), 0.7),
        food("Pisang", "Buah", Some(51), 1.1),
        food("Mangga", "Buah", Some(56), 0.8),
        food("Semangka", "Buah", Some(72), 0.6),
        food("Durian", "Buah", None, 1.5),
        food("Ayam", "Protein hewani", Some(0), 27.0),
        food("Ikan Kembung", "Protein hewani", Some(0), 22.0),
        food("Telur", "Protein hewani", Some(0), 13.0),
        food("Sirup", "Minuman manis", Some(68), 0.0),
        food("Teh Manis", "Minuman manis", Some(65), 0.0),
        food("Soda", "Minuman manis", Some(63), 0.0),
    ];
    let vegetables = [
        ("Bayam", 15),
        ("Brokoli", 10),
        ("Kangkung", 12),
        ("Sawi", 15),
        ("Kol", 10),
        ("Tomat", 15),
        ("Timun", 15),
        ("Terong", 20),
        ("Buncis", 30),
        ("Wortel", 35),
        ("Labu Siam", 24),
        ("Kacang Panjang", 28),
        ("Jagung Muda", 48),
        ("Ubi Jalar", 44),
        ("Kentang Rebus", 50),
    ];
    for (name, gi) in vegetables {
        items.push(food(name, "Sayur", Some(gi), 2.5));
    }
    items.push(food("Brokoli", "Sayur", Some(12), 2.8));

    Arc::new(FoodCatalog::from_items(items).expect("fixture catalog"))
}

pub(super) fn low_risk_profile() -> HealthProfile {
    HealthProfile::new(25.0, 22.0, 85.0, 8.0).expect("valid profile")
}

pub(super) fn medium_risk_profile() -> HealthProfile {
    HealthProfile::new(45.0, 26.0, 105.0, 12.0).expect("valid profile")
}

pub(super) fn high_risk_profile() -> HealthProfile {
    HealthProfile::new(55.0, 32.0, 140.0, 25.0).expect("valid profile")
}

pub(super) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn engine() -> RecommendationEngine {
    RecommendationEngine::new(catalog(), RecommendationConfig::default())
}

pub(super) fn build_service() -> (
    Arc<RecommendationService<MemoryLog>>,
    Arc<MemoryLog>,
) {
    let log = Arc::new(MemoryLog::default());
    let service = Arc::new(RecommendationService::new(Arc::new(engine()), log.clone()));
    (service, log)
}

pub(super) fn router_with_service(service: Arc<RecommendationService<MemoryLog>>) -> Router {
    recommendation_router(service)
}

#[derive(Default)]
pub(super) struct MemoryLog {
    pub(super) records: Mutex<Vec<RecommendationRecord>>,
}

impl MemoryLog {
    pub(super) fn records(&self) -> Vec<RecommendationRecord> {
        self.records.lock().expect("log lock").clone()
    }
}

impl RecommendationLog for MemoryLog {
    fn append(&self, record: RecommendationRecord) -> Result<(), LogError> {
        self.records.lock().expect("log lock").push(record);
        Ok(())
    }
}

pub(super) struct UnavailableLog;

impl RecommendationLog for UnavailableLog {
    fn append(&self, _record: RecommendationRecord) -> Result<(), LogError> {
        Err(LogError::Unavailable("disk full".to_string()))
    }
}

/// Classifier returning a fixed label, or failing when `None`.
pub(super) struct FixedClassifier(pub(super) Option<u8>);

impl RiskClassifier for FixedClassifier {
    fn predict(&self, _profile: &HealthProfile) -> Result<RiskPrediction, ModelError> {
        let label = self
            .0
            .ok_or_else(|| ModelError::Unavailable("classifier offline".to_string()))?;
        Ok(RiskPrediction {
            label,
            probability: if label == 1 { 0.9 } else { 0.1 },
            feature_order: Vec::new(),
            features: Vec::new(),
            scaled_features: Vec::new(),
        })
    }
}

/// Suitability model preferring low-GI foods, or failing on every call.
pub(super) struct GiModel {
    pub(super) fail: bool,
}

impl SuitabilityModel for GiModel {
    fn name(&self) -> &str {
        "gi_model"
    }

    fn score(
        &self,
        _profile: &HealthProfile,
        nutrients: &NutrientVector,
    ) -> Result<f64, ModelError> {
        if self.fail {
            return Err(ModelError::NonFinite("suitability score"));
        }
        Ok(100.0 - nutrients.glycemic_index)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
