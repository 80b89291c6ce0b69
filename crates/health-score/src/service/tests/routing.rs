use super::common::*;
use axum::extract::{Path, Query, State};
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use crate::service::router::{customer_handler, history_handler, AsOfQuery, HistoryQuery};

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::get(uri)
        .body(axum::body::Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn customer_handler_returns_health_view() {
    let service = Arc::new(build_service());

    let response = customer_handler::<MemorySource>(
        State(service),
        Path("globex".to_string()),
        Query(AsOfQuery {
            as_of: Some(as_of()),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["customer_id"], "globex");
    assert_eq!(payload["name"], "Globex");
    assert_eq!(payload["as_of"], "2024-06-01");
    assert!(payload["health_score"].as_u64().is_some());
    assert!(payload["health_tier"].is_string());
}

#[tokio::test]
async fn customer_handler_returns_not_found_with_id() {
    let service = Arc::new(build_service());

    let response = customer_handler::<MemorySource>(
        State(service),
        Path("missing".to_string()),
        Query(AsOfQuery {
            as_of: Some(as_of()),
        }),
    )
    .await;

    assert_not_found_response(&response);
    let payload = read_json_body(response).await;
    assert_eq!(payload["customer_id"], "missing");
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("not found"));
}

#[tokio::test]
async fn list_route_scores_population() {
    let router = router_with_service(build_service());

    let response = router
        .oneshot(get("/api/v1/customers?as_of=2024-06-01"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let customers = payload.as_array().expect("array payload");
    assert_eq!(customers.len(), 5);
    assert_eq!(customers[0]["customer_id"], "acme");
    assert_eq!(customers[0]["last_activity_at"], "2024-05-31T09:30:00");
}

#[tokio::test]
async fn health_route_accepts_missing_as_of() {
    let router = router_with_service(build_service());

    let response = router
        .oneshot(get("/api/v1/customers/acme/health"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_as_of_is_rejected() {
    let router = router_with_service(build_service());

    let response = router
        .oneshot(get("/api/v1/customers/acme/health?as_of=June-first"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unavailable_source_maps_to_service_unavailable() {
    let router = router_with_service(unavailable_service());

    let response = router
        .oneshot(get("/api/v1/customers?as_of=2024-06-01"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("warehouse offline"));
}

#[tokio::test]
async fn history_handler_defaults_to_six_months() {
    let service = Arc::new(build_service());

    let response = history_handler::<MemorySource>(
        State(service),
        Path("acme".to_string()),
        Query(HistoryQuery {
            as_of: Some(as_of()),
            months: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["customer_id"], "acme");
    let history = payload["history"].as_array().expect("history array");
    assert_eq!(history.len(), 6);
    assert_eq!(history[0]["as_of"], "2024-06-01");
    assert_eq!(history[5]["as_of"], "2024-01-01");
}

#[tokio::test]
async fn history_route_honours_months_and_unknown_ids() {
    let router = router_with_service(build_service());

    let response = router
        .clone()
        .oneshot(get("/api/v1/customers/globex/history?as_of=2024-06-01&months=3"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let history = payload["history"].as_array().expect("history array");
    assert_eq!(history.len(), 3);
    assert_eq!(history[2]["as_of"], "2024-04-01");
    assert!(history.iter().all(|point| point["health_tier"].is_string()));

    let response = router
        .oneshot(get("/api/v1/customers/missing/history?as_of=2024-06-01"))
        .await
        .expect("route executes");
    assert_not_found_response(&response);
}
