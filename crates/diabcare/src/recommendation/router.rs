use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::engine::{RecommendationError, RecommendationRequest};
use super::service::RecommendationService;
use crate::history::RecommendationLog;
use crate::profile::{HealthProfile, ProfileInput};

/// `POST /recommend_food` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RecommendFoodPayload {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub user_data: ProfileInput,
    #[serde(default)]
    pub top_n: Option<usize>,
}

/// Router builder exposing the recommendation and catalog endpoints.
pub fn recommendation_router<L>(service: Arc<RecommendationService<L>>) -> Router
where
    L: RecommendationLog + 'static,
{
    Router::new()
        .route("/recommend_food", post(recommend_handler::<L>))
        .route("/api/v1/catalog/categories", get(categories_handler::<L>))
        .with_state(service)
}

pub(crate) async fn recommend_handler<L>(
    State(service): State<Arc<RecommendationService<L>>>,
    payload: Result<axum::Json<RecommendFoodPayload>, JsonRejection>,
) -> Response
where
    L: RecommendationLog + 'static,
{
    let payload = match payload {
        Ok(axum::Json(payload)) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let category = match payload.category.as_deref().map(str::trim) {
        Some(category) if !category.is_empty() => category.to_string(),
        _ => return bad_request("category is required".to_string()),
    };
    let profile = match HealthProfile::try_from(payload.user_data) {
        Ok(profile) => profile,
        Err(error) => return bad_request(error.to_string()),
    };

    let request = RecommendationRequest {
        category: category.clone(),
        profile,
        top_n: payload.top_n,
    };
    let now = Utc::now();

    match service.recommend_at(request, now) {
        Ok(response) => {
            let body = json!({
                "success": true,
                "total_recommendations": response.recommendations.len(),
                "recommendations": response.recommendations,
                "category_requested": category,
                "user_profile": profile,
                "risk_level": response.risk.tier,
                "risk_assessment": response.risk,
                "gi_filter": response.gi_filter_description,
                "model_used": response.model_used,
                "debug_info": response.diagnostics,
                "timestamp": now.to_rfc3339(),
            });
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(
            error @ (RecommendationError::EmptyCategory(_)
            | RecommendationError::EmptyAfterFilter(_)),
        ) => {
            let body = json!({
                "success": false,
                "error": error.to_string(),
                "reason": error.context().map(|context| context.reason.clone()),
                "suggestion": error.context().map(|context| context.suggestion.clone()),
                "debug_info": error.context(),
                "timestamp": now.to_rfc3339(),
            });
            (StatusCode::NOT_FOUND, axum::Json(body)).into_response()
        }
        Err(error) => bad_request(error.to_string()),
    }
}

pub(crate) async fn categories_handler<L>(
    State(service): State<Arc<RecommendationService<L>>>,
) -> Response
where
    L: RecommendationLog + 'static,
{
    let categories = service.categories();
    let body = json!({
        "total_categories": categories.len(),
        "total_items": service.engine().catalog().len(),
        "categories": categories,
    });
    (StatusCode::OK, axum::Json(body)).into_response()
}

fn bad_request(message: String) -> Response {
    let payload = json!({
        "success": false,
        "error": message,
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}
