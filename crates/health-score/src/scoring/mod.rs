//! Population-relative customer health scoring.
//!
//! A run converts a [`PopulationSnapshot`] into one [`ScoredCustomer`] per customer:
//! observation windows and confidence, windowed rate aggregation, midrank percentiles over the
//! whole population, shrinkage toward the neutral midpoint, and the weighted combiner. Every
//! stage is pure; the engine performs no I/O and keeps no state between runs.

pub mod aggregate;
pub mod combine;
pub mod config;
pub mod domain;
mod engine;
pub mod percentile;
pub mod shrinkage;
pub mod source;
pub mod window;

pub use aggregate::{aggregate_rates, ActivityTotals};
pub use combine::{combine_score, combine_with, tier};
pub use config::ScoringConfig;
pub use domain::{
    ConfidenceVector, Customer, CustomerHistory, CustomerId, Event, EventKind, HealthTier, Metric,
    PercentileVector, Polarity, PopulationSnapshot, RateVector, ScoreComponent, ScoredCustomer,
    Severity,
};
pub use engine::HealthScoringEngine;
pub use percentile::midrank_percentiles;
pub use shrinkage::{finance_confidence, shrink};
pub use source::{PopulationSource, SourceError};
pub use window::ObservationWindow;

use chrono::NaiveDate;

/// Scores every customer in `snapshot` with the standard configuration.
pub fn score_population(snapshot: &PopulationSnapshot, as_of: NaiveDate) -> Vec<ScoredCustomer> {
    HealthScoringEngine::default().score_population(snapshot, as_of)
}

/// Scores a single customer with the standard configuration, ranking it against `snapshot`.
pub fn score_one(
    snapshot: &PopulationSnapshot,
    as_of: NaiveDate,
    customer_id: &CustomerId,
) -> Result<ScoredCustomer, ScoringError> {
    HealthScoringEngine::default().score_one(snapshot, as_of, customer_id)
}

/// Error raised by the scoring engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("customer {customer_id} not found in population snapshot")]
    NotFound { customer_id: CustomerId },
}
