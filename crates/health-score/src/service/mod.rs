//! Request-facing layer over the scoring engine.
//!
//! [`HealthScoreService`] captures a population snapshot from a [`PopulationSource`] and runs
//! the engine against it; [`health_router`] exposes the read-only HTTP surface.
//!
//! [`PopulationSource`]: crate::scoring::PopulationSource

mod health;
pub mod router;
mod views;

#[cfg(test)]
mod tests;

pub use health::{HealthScoreService, HealthServiceError, MAX_HISTORY_MONTHS};
pub use router::{health_router, parse_date};
pub use views::{CustomerHealthHistory, CustomerHealthView, HealthHistoryPoint};
