use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use axum::Router;
use chrono::{Duration, NaiveDate};
use serde_json::Value;

use crate::scoring::{
    Customer, CustomerId, Event, EventKind, PopulationSnapshot, PopulationSource, ScoringConfig,
    SourceError,
};
use crate::service::{health_router, HealthScoreService};

pub(super) fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

pub(super) fn joined() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
}

pub(super) fn logins(customer: &str, count: i64) -> Vec<Event> {
    (1..=count)
        .map(|offset| Event {
            customer_id: CustomerId::new(customer),
            occurred_at: (as_of() - Duration::days(offset))
                .and_hms_opt(9, 30, 0)
                .expect("valid time"),
            kind: EventKind::Login,
        })
        .collect()
}

fn profile(id: &str, name: &str, join_date: NaiveDate) -> Customer {
    Customer {
        name: Some(name.to_string()),
        segment: Some("mid-market".to_string()),
        plan: Some("growth".to_string()),
        ..Customer::new(id, Some(join_date))
    }
}

/// Four tenured customers separated only by login volume, plus one joining on the scoring day.
pub(super) fn population() -> PopulationSnapshot {
    let mut snapshot = PopulationSnapshot::new();
    snapshot.insert(profile("acme", "Acme Corp", joined()), logins("acme", 40));
    snapshot.insert(profile("globex", "Globex", joined()), logins("globex", 20));
    snapshot.insert(profile("initech", "Initech", joined()), logins("initech", 10));
    snapshot.insert(profile("umbrella", "Umbrella", joined()), Vec::new());
    snapshot.insert(profile("hooli", "Hooli", as_of()), Vec::new());
    snapshot
}

pub(super) struct MemorySource {
    snapshot: PopulationSnapshot,
}

impl MemorySource {
    pub(super) fn new(snapshot: PopulationSnapshot) -> Self {
        Self { snapshot }
    }
}

impl PopulationSource for MemorySource {
    fn load_population(
        &self,
        _as_of: NaiveDate,
        _lookback_days: u32,
    ) -> Result<PopulationSnapshot, SourceError> {
        Ok(self.snapshot.clone())
    }
}

pub(super) struct UnavailableSource;

impl PopulationSource for UnavailableSource {
    fn load_population(
        &self,
        _as_of: NaiveDate,
        _lookback_days: u32,
    ) -> Result<PopulationSnapshot, SourceError> {
        Err(SourceError::Unavailable("warehouse offline".to_string()))
    }
}

pub(super) fn build_service() -> HealthScoreService<MemorySource> {
    HealthScoreService::new(
        Arc::new(MemorySource::new(population())),
        ScoringConfig::standard(),
    )
}

pub(super) fn unavailable_service() -> HealthScoreService<UnavailableSource> {
    HealthScoreService::new(Arc::new(UnavailableSource), ScoringConfig::standard())
}

pub(super) fn router_with_service<S>(service: HealthScoreService<S>) -> Router
where
    S: PopulationSource + 'static,
{
    health_router(Arc::new(service))
}

pub(super) fn assert_not_found_response(response: &Response) {
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
