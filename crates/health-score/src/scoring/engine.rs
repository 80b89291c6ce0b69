use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use super::aggregate::aggregate_rates;
use super::combine::combine_with;
use super::config::ScoringConfig;
use super::domain::{
    ConfidenceVector, CustomerId, Metric, PercentileVector, PopulationSnapshot, RateVector,
    ScoreComponent, ScoredCustomer,
};
use super::percentile::midrank_percentiles;
use super::shrinkage::{finance_confidence, shrink};
use super::window::ObservationWindow;
use super::ScoringError;

/// Stateless scorer applying a [`ScoringConfig`] to whole population snapshots.
#[derive(Debug, Clone, Default)]
pub struct HealthScoringEngine {
    config: ScoringConfig,
}

/// Per-customer output of the window and aggregation stages.
#[derive(Debug, Clone)]
struct CustomerMetrics {
    customer_id: CustomerId,
    window: ObservationWindow,
    rates: RateVector,
}

impl HealthScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores every customer in the snapshot, ordered by customer id.
    pub fn score_population(
        &self,
        snapshot: &PopulationSnapshot,
        as_of: NaiveDate,
    ) -> Vec<ScoredCustomer> {
        let metrics: Vec<CustomerMetrics> = snapshot
            .histories()
            .map(|history| {
                let window = ObservationWindow::derive(
                    history.customer.join_date,
                    as_of,
                    self.config.max_lookback_days,
                );
                let rates = aggregate_rates(&history.events, &window, &self.config);
                CustomerMetrics {
                    customer_id: history.customer.id.clone(),
                    window,
                    rates,
                }
            })
            .collect();
        debug!(customers = metrics.len(), %as_of, "aggregated windowed activity");

        let ranks: BTreeMap<Metric, BTreeMap<CustomerId, f64>> = Metric::ALL
            .iter()
            .map(|metric| {
                let values = metrics
                    .iter()
                    .map(|entry| (entry.customer_id.clone(), metric.raw_value(&entry.rates)))
                    .collect();
                (*metric, midrank_percentiles(values, metric.polarity()))
            })
            .collect();
        debug!(metrics = ranks.len(), %as_of, "ranked population percentiles");

        let scored: Vec<ScoredCustomer> = metrics
            .into_iter()
            .map(|entry| self.finalize(entry, &ranks))
            .collect();

        debug!(
            customers = scored.len(),
            %as_of,
            "scored population snapshot"
        );
        scored
    }

    /// Scores one customer against the full snapshot.
    pub fn score_one(
        &self,
        snapshot: &PopulationSnapshot,
        as_of: NaiveDate,
        customer_id: &CustomerId,
    ) -> Result<ScoredCustomer, ScoringError> {
        if !snapshot.contains(customer_id) {
            return Err(ScoringError::NotFound {
                customer_id: customer_id.clone(),
            });
        }

        self.score_population(snapshot, as_of)
            .into_iter()
            .find(|scored| &scored.customer_id == customer_id)
            .ok_or_else(|| ScoringError::NotFound {
                customer_id: customer_id.clone(),
            })
    }

    fn finalize(
        &self,
        entry: CustomerMetrics,
        ranks: &BTreeMap<Metric, BTreeMap<CustomerId, f64>>,
    ) -> ScoredCustomer {
        let raw_percentiles = PercentileVector::from_fn(|metric| {
            ranks
                .get(&metric)
                .and_then(|by_customer| by_customer.get(&entry.customer_id))
                .copied()
                .unwrap_or(PercentileVector::NEUTRAL.get(metric))
        });

        let time_confidence = entry.window.confidence;
        let confidence = ConfidenceVector::from_fn(|metric| match metric {
            Metric::Finance => {
                finance_confidence(entry.rates.invoices_total, &self.config.finance_prior)
            }
            Metric::Engagement | Metric::Adoption | Metric::Support => time_confidence,
        });

        let percentiles = PercentileVector::from_fn(|metric| {
            shrink(raw_percentiles.get(metric), confidence.get(metric))
        });

        let components = Metric::ALL
            .iter()
            .map(|metric| {
                let weight = self.config.weights.weight(*metric);
                ScoreComponent {
                    metric: *metric,
                    raw_percentile: raw_percentiles.get(*metric),
                    confidence: confidence.get(*metric),
                    percentile: percentiles.get(*metric),
                    weight,
                    contribution: weight * percentiles.get(*metric),
                }
            })
            .collect();

        let score = combine_with(&self.config, &percentiles);
        let tier = self.config.tiers.classify(score);

        ScoredCustomer {
            customer_id: entry.customer_id,
            score,
            tier,
            rates: entry.rates,
            percentiles,
            raw_percentiles,
            confidence,
            components,
        }
    }
}
