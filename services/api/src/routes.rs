use crate::infra::AppState;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use chrono::Utc;
use diabcare::error::AppError;
use diabcare::history::{PredictionLog, PredictionRecord, RecommendationLog};
use diabcare::prediction::ModelError;
use diabcare::profile::{HealthProfile, ProfileInput};
use diabcare::recommendation::{assess_by_rules, recommendation_router, RecommendationService};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) fn with_service_routes<L>(service: Arc<RecommendationService<L>>) -> axum::Router
where
    L: RecommendationLog + 'static,
{
    recommendation_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/predict", axum::routing::post(predict_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({
            "status": "ready",
            "classifier_loaded": state.classifier.is_some(),
        })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Binary risk prediction alongside the rule-based tier and the GI limit it implies.
pub(crate) async fn predict_endpoint(
    Extension(state): Extension<AppState>,
    payload: Result<Json<ProfileInput>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let profile = match HealthProfile::try_from(input) {
        Ok(profile) => profile,
        Err(err) => return bad_request(err.to_string()),
    };

    let Some(classifier) = state.classifier.as_ref() else {
        return AppError::from(ModelError::Unavailable(
            "risk classifier is not configured".to_string(),
        ))
        .into_response();
    };

    let prediction = match classifier.predict(&profile) {
        Ok(prediction) => prediction,
        Err(err) => {
            warn!(error = %err, "risk prediction failed");
            return AppError::from(err).into_response();
        }
    };

    let now = Utc::now();
    if let Err(err) = state.predictions.append(PredictionRecord {
        profile,
        label: prediction.label,
        probability: prediction.probability,
        created_at: now,
    }) {
        warn!(error = %err, "failed to append prediction history");
    }

    let rules = assess_by_rules(&profile);
    info!(
        label = prediction.label,
        probability = prediction.probability,
        tier = rules.tier.label(),
        "risk prediction served"
    );

    let features: serde_json::Map<String, serde_json::Value> = prediction
        .feature_order
        .iter()
        .cloned()
        .zip(prediction.features.iter().map(|value| json!(value)))
        .collect();

    let result = if prediction.is_positive() {
        "Diabetes risk detected"
    } else {
        "No diabetes risk detected"
    };

    let body = json!({
        "success": true,
        "prediction": prediction.label,
        "probability": prediction.probability,
        "result": result,
        "risk_level": rules.tier,
        "risk_points": rules.points,
        "gi_filter": state.thresholds.describe(rules.tier),
        "max_glycemic_index": state.thresholds.for_tier(rules.tier),
        "user_profile": profile,
        "features": features,
        "scaled_features": prediction.scaled_features,
        "timestamp": now.to_rfc3339(),
    });
    (StatusCode::OK, Json(body)).into_response()
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryPredictionLog, InMemoryRecommendationLog};
    use axum::body::Body;
    use axum::http::Request;
    use diabcare::catalog::{FoodCatalog, FoodItem};
    use diabcare::prediction::{LogisticRiskClassifier, RiskClassifier, StandardScaler};
    use diabcare::recommendation::{GiThresholds, RecommendationConfig, RecommendationEngine};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn classifier() -> Arc<dyn RiskClassifier> {
        let scaler = StandardScaler::new(vec![120.0, 80.0, 32.0, 33.0], vec![32.0, 115.0, 8.0, 12.0])
            .expect("scaler");
        let classifier = LogisticRiskClassifier::new(
            vec![
                "Glucose".to_string(),
                "Insulin".to_string(),
                "BMI".to_string(),
                "Age".to_string(),
            ],
            Some(scaler),
            vec![1.1, -0.1, 0.7, 0.4],
            -0.8,
            0.5,
        )
        .expect("classifier");
        Arc::new(classifier)
    }

    fn state(classifier: Option<Arc<dyn RiskClassifier>>, ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            classifier,
            predictions: Arc::new(InMemoryPredictionLog::default()),
            thresholds: GiThresholds::default(),
        }
    }

    fn app(state: AppState) -> axum::Router {
        let catalog = FoodCatalog::from_items(vec![FoodItem {
            name: "Tempe".to_string(),
            category: "Protein Nabati".to_string(),
            glycemic_index: Some(15),
            calories: 193.0,
            carbohydrates: 9.4,
            protein: 19.0,
            fat: 10.8,
            fiber: 1.4,
            sodium: 9.0,
            sugar: 0.0,
            suitable_for_diabetes: true,
        }])
        .expect("catalog");
        let engine = RecommendationEngine::new(Arc::new(catalog), RecommendationConfig::default());
        let service = Arc::new(RecommendationService::new(
            Arc::new(engine),
            Arc::new(InMemoryRecommendationLog::default()),
        ));
        with_service_routes(service).layer(Extension(state))
    }

    fn predict_request(body: Value) -> Request<Body> {
        Request::post("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn read_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let response = app(state(None, false))
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(state(None, true))
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["classifier_loaded"], json!(false));
    }

    #[tokio::test]
    async fn predict_without_classifier_is_unavailable() {
        let response = app(state(None, true))
            .oneshot(predict_request(
                json!({"age": 45, "bmi": 28.5, "glucose": 120, "insulin": 15}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn predict_returns_label_and_rule_tier() {
        let state = state(Some(classifier()), true);
        let predictions = Arc::clone(&state.predictions);

        let response = app(state)
            .oneshot(predict_request(
                json!({"age": 55, "bmi": 32, "glucose": 140, "insulin": 25}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["prediction"], json!(1));
        assert_eq!(body["risk_level"], json!("high"));
        assert_eq!(body["risk_points"], json!(10));
        assert_eq!(body["max_glycemic_index"], json!(35));
        assert_eq!(body["features"]["Glucose"], json!(140.0));
        assert_eq!(predictions.records().len(), 1);
    }

    #[tokio::test]
    async fn predict_rejects_invalid_profiles() {
        let response = app(state(Some(classifier()), true))
            .oneshot(predict_request(json!({"age": 45, "bmi": 28.5, "glucose": 120})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_json(response).await["error"],
            json!("missing user data field: insulin")
        );
    }

    #[tokio::test]
    async fn recommendation_routes_are_mounted() {
        let response = app(state(None, true))
            .oneshot(
                Request::post("/recommend_food")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "category": "Protein Nabati",
                            "user_data": {"age": 30, "bmi": 23, "glucose": 90, "insulin": 9},
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["total_recommendations"], json!(1));
    }

    #[tokio::test]
    async fn health_and_metrics_respond() {
        let response = app(state(None, true))
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(state(None, true))
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
