use chrono::NaiveDate;
use health_score::config::PopulationConfig;
use health_score::import::CsvPopulationSource;
use health_score::scoring::{PopulationSnapshot, PopulationSource, ScoringConfig, SourceError};
use health_score::service::HealthScoreService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Population source serving a snapshot assembled in memory.
#[derive(Debug, Clone, Default)]
pub(crate) struct StaticPopulationSource {
    snapshot: PopulationSnapshot,
}

impl StaticPopulationSource {
    pub(crate) fn new(snapshot: PopulationSnapshot) -> Self {
        Self { snapshot }
    }
}

impl PopulationSource for StaticPopulationSource {
    fn load_population(
        &self,
        _as_of: NaiveDate,
        _lookback_days: u32,
    ) -> Result<PopulationSnapshot, SourceError> {
        Ok(self.snapshot.clone())
    }
}

pub(crate) fn scoring_config(lookback_days: u32) -> ScoringConfig {
    ScoringConfig::standard().with_max_lookback_days(lookback_days)
}

pub(crate) fn csv_service(
    population: &PopulationConfig,
) -> HealthScoreService<CsvPopulationSource> {
    let source = CsvPopulationSource::new(
        population.customers_csv.clone(),
        population.events_csv.clone(),
    );
    info!(
        customers_csv = %source.customers_path().display(),
        events_csv = %source.events_path().display(),
        lookback_days = population.lookback_days,
        "population source configured"
    );
    HealthScoreService::new(Arc::new(source), scoring_config(population.lookback_days))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    health_score::service::parse_date(raw)
}
