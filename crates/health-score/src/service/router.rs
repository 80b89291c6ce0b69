use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::error;

use super::health::{HealthScoreService, HealthServiceError};
use crate::scoring::{CustomerId, PopulationSource};

/// Router builder exposing read-only scoring endpoints.
pub fn health_router<S>(service: Arc<HealthScoreService<S>>) -> Router
where
    S: PopulationSource + 'static,
{
    Router::new()
        .route("/api/v1/customers", get(list_handler::<S>))
        .route(
            "/api/v1/customers/:customer_id/health",
            get(customer_handler::<S>),
        )
        .route(
            "/api/v1/customers/:customer_id/history",
            get(history_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AsOfQuery {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) as_of: Option<NaiveDate>,
}

impl AsOfQuery {
    fn resolve(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// Number of monthly points returned when `months` is omitted.
const DEFAULT_HISTORY_MONTHS: u32 = 6;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryQuery {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) as_of: Option<NaiveDate>,
    pub(crate) months: Option<u32>,
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<HealthScoreService<S>>>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    S: PopulationSource + 'static,
{
    let as_of = query.resolve();
    let outcome = tokio::task::spawn_blocking(move || service.score_all(as_of)).await;

    match outcome {
        Ok(Ok(views)) => (StatusCode::OK, axum::Json(views)).into_response(),
        Ok(Err(err)) => service_error_response(err, None),
        Err(join_error) => internal_error(join_error),
    }
}

pub(crate) async fn customer_handler<S>(
    State(service): State<Arc<HealthScoreService<S>>>,
    Path(customer_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    S: PopulationSource + 'static,
{
    let as_of = query.resolve();
    let id = CustomerId(customer_id);
    let lookup = id.clone();
    let outcome =
        tokio::task::spawn_blocking(move || service.score_customer(as_of, &lookup)).await;

    match outcome {
        Ok(Ok(view)) => (StatusCode::OK, axum::Json(view)).into_response(),
        Ok(Err(err)) => service_error_response(err, Some(&id)),
        Err(join_error) => internal_error(join_error),
    }
}

pub(crate) async fn history_handler<S>(
    State(service): State<Arc<HealthScoreService<S>>>,
    Path(customer_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    S: PopulationSource + 'static,
{
    let as_of = AsOfQuery { as_of: query.as_of }.resolve();
    let months = query.months.unwrap_or(DEFAULT_HISTORY_MONTHS);
    let id = CustomerId(customer_id);
    let lookup = id.clone();
    let outcome =
        tokio::task::spawn_blocking(move || service.score_history(as_of, &lookup, months)).await;

    match outcome {
        Ok(Ok(history)) => (StatusCode::OK, axum::Json(history)).into_response(),
        Ok(Err(err)) => service_error_response(err, Some(&id)),
        Err(join_error) => internal_error(join_error),
    }
}

fn service_error_response(err: HealthServiceError, customer_id: Option<&CustomerId>) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "scoring request failed");
    }

    let payload = match customer_id {
        Some(id) => json!({
            "error": err.to_string(),
            "customer_id": id.as_str(),
        }),
        None => json!({
            "error": err.to_string(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}

fn internal_error(join_error: tokio::task::JoinError) -> Response {
    error!(error = %join_error, "scoring task aborted");
    let payload = json!({
        "error": "scoring run aborted",
    });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.filter(|value| !value.trim().is_empty())
        .map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
