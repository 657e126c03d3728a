use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::recommendation::router::{recommend_handler, RecommendFoodPayload};
use crate::profile::ProfileInput;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request")
}

#[tokio::test]
async fn recommend_route_returns_ranked_foods() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_json(
            "/recommend_food",
            json!({
                "category": "Sayur",
                "user_data": {"age": 45, "bmi": 28.5, "glucose": 120, "insulin": 15},
                "top_n": 4,
            }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["total_recommendations"], json!(4));
    assert_eq!(body["category_requested"], json!("Sayur"));
    assert_eq!(body["risk_level"], json!("medium"));
    assert_eq!(body["model_used"], json!("rule_based"));
    assert_eq!(body["debug_info"]["mapped_category"], json!("Sayur"));

    let recs = body["recommendations"].as_array().expect("recommendations array");
    let gis: Vec<u64> = recs
        .iter()
        .map(|rec| rec["glycemic_index"].as_u64().expect("gi"))
        .collect();
    assert!(gis.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(recs[0]["recommendation_reason"]
        .as_str()
        .expect("reason")
        .starts_with("GI "));
}

#[tokio::test]
async fn invalid_profile_is_a_bad_request() {
    let (service, log) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_json(
            "/recommend_food",
            json!({
                "category": "Buah",
                "user_data": {"age": 25, "bmi": 22, "glucose": 5000, "insulin": 8},
            }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().expect("error").contains("glucose"));
    assert!(log.records().is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::post("/recommend_food")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"category\": "))
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_category_is_a_bad_request() {
    let (service, _) = build_service();
    let payload = RecommendFoodPayload {
        category: Some("   ".to_string()),
        user_data: ProfileInput::new(25.0, 22.0, 85.0, 8.0),
        top_n: None,
    };

    let response = recommend_handler(State(service), Ok(axum::Json(payload))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], json!("category is required"));
}

#[tokio::test]
async fn unknown_category_is_not_found_with_suggestion() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_json(
            "/recommend_food",
            json!({
                "category": "Kue",
                "user_data": {"age": 25, "bmi": 22, "glucose": 85, "insulin": 8},
            }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["suggestion"].as_str().expect("suggestion").contains("Buah"));
    assert_eq!(body["debug_info"]["stage"], json!("category_resolved"));
}

#[tokio::test]
async fn filtered_out_category_is_not_found_with_counts() {
    let (service, _) = build_service();
    let payload = RecommendFoodPayload {
        category: Some("Minuman manis".to_string()),
        user_data: ProfileInput::new(55.0, 32.0, 140.0, 25.0),
        top_n: Some(3),
    };

    let response = recommend_handler(State(service), Ok(axum::Json(payload))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["debug_info"]["stage"], json!("filtered"));
    assert_eq!(body["debug_info"]["candidates_in_category"], json!(3));
    assert_eq!(body["debug_info"]["gi_threshold"], json!(35));
}

#[tokio::test]
async fn oversized_top_n_is_a_bad_request() {
    let (service, _) = build_service();
    let payload = RecommendFoodPayload {
        category: Some("Buah".to_string()),
        user_data: ProfileInput::new(25.0, 22.0, 85.0, 8.0),
        top_n: Some(500),
    };

    let response = recommend_handler(State(Arc::clone(&service)), Ok(axum::Json(payload))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn categories_route_lists_counts() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/catalog/categories")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["total_categories"], json!(4));
    assert_eq!(body["total_items"], json!(32));
    let buah = body["categories"]
        .as_array()
        .expect("categories")
        .iter()
        .find(|category| category["name"] == json!("Buah"))
        .expect("Buah listed")
        .clone();
    assert_eq!(buah["items"], json!(10));
    assert_eq!(buah["low_gi_items"], json!(6));
}
