use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{Months, NaiveDate};
use tracing::{debug, info};

use super::views::{CustomerHealthHistory, CustomerHealthView, HealthHistoryPoint};
use crate::scoring::{
    CustomerId, HealthScoringEngine, PopulationSnapshot, PopulationSource, ScoringConfig,
    ScoringError, SourceError,
};

/// Upper bound on the number of monthly points a history request may ask for.
pub const MAX_HISTORY_MONTHS: u32 = 24;

/// Service composing a population source with the scoring engine.
///
/// Every call captures a fresh snapshot, so concurrent requests never share ranking state.
pub struct HealthScoreService<S> {
    source: Arc<S>,
    engine: Arc<HealthScoringEngine>,
    lookback_days: u32,
}

impl<S> HealthScoreService<S>
where
    S: PopulationSource + 'static,
{
    pub fn new(source: Arc<S>, config: ScoringConfig) -> Self {
        let lookback_days = config.max_lookback_days;
        Self {
            source,
            engine: Arc::new(HealthScoringEngine::new(config)),
            lookback_days,
        }
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    pub fn engine(&self) -> &HealthScoringEngine {
        &self.engine
    }

    /// Captures the population for `as_of`; a source failure aborts the run.
    pub fn snapshot(&self, as_of: NaiveDate) -> Result<PopulationSnapshot, HealthServiceError> {
        let snapshot = self.source.load_population(as_of, self.lookback_days)?;
        debug!(customers = snapshot.len(), %as_of, "captured population snapshot");
        Ok(snapshot)
    }

    /// Scores the full population as of `as_of`.
    pub fn score_all(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<CustomerHealthView>, HealthServiceError> {
        let snapshot = self.snapshot(as_of)?;
        let scored = self.engine.score_population(&snapshot, as_of);

        let views: Vec<CustomerHealthView> = scored
            .into_iter()
            .filter_map(|customer| {
                snapshot
                    .get(&customer.customer_id)
                    .map(|history| CustomerHealthView::new(history, customer, as_of))
            })
            .collect();

        info!(customers = views.len(), %as_of, "scored customer population");
        Ok(views)
    }

    /// Scores one customer against the full population as of `as_of`.
    pub fn score_customer(
        &self,
        as_of: NaiveDate,
        customer_id: &CustomerId,
    ) -> Result<CustomerHealthView, HealthServiceError> {
        let snapshot = self.snapshot(as_of)?;
        let scored = self.engine.score_one(&snapshot, as_of, customer_id)?;
        let history = snapshot
            .get(customer_id)
            .ok_or_else(|| ScoringError::NotFound {
                customer_id: customer_id.clone(),
            })?;

        info!(
            customer_id = %customer_id,
            score = scored.score,
            tier = %scored.tier,
            "scored customer"
        );
        Ok(CustomerHealthView::new(history, scored, as_of))
    }

    /// Scores one customer at `as_of` and at each of the `months - 1` preceding monthly steps.
    ///
    /// Every point is ranked against its own snapshot. Points before the customer's join date
    /// are skipped; an unknown id fails on the first point.
    pub fn score_history(
        &self,
        as_of: NaiveDate,
        customer_id: &CustomerId,
        months: u32,
    ) -> Result<CustomerHealthHistory, HealthServiceError> {
        let mut history = Vec::new();
        for step in 0..months.clamp(1, MAX_HISTORY_MONTHS) {
            let Some(point) = as_of.checked_sub_months(Months::new(step)) else {
                break;
            };
            let snapshot = self.snapshot(point)?;
            let joined_later = snapshot
                .get(customer_id)
                .and_then(|entry| entry.customer.join_date)
                .is_some_and(|join_date| join_date > point);
            if step > 0 && joined_later {
                break;
            }

            let scored = self.engine.score_one(&snapshot, point, customer_id)?;
            history.push(HealthHistoryPoint::new(&scored, point));
        }

        info!(
            customer_id = %customer_id,
            points = history.len(),
            %as_of,
            "scored customer history"
        );
        Ok(CustomerHealthHistory {
            customer_id: customer_id.clone(),
            as_of,
            history,
        })
    }
}

/// Error raised by the health scoring service.
#[derive(Debug, thiserror::Error)]
pub enum HealthServiceError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl HealthServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthServiceError::Scoring(ScoringError::NotFound { .. }) => StatusCode::NOT_FOUND,
            HealthServiceError::Source(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
