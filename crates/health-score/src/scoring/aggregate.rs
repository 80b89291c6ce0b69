use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::config::ScoringConfig;
use super::domain::{Event, EventKind, RateVector};
use super::window::ObservationWindow;

/// Raw counts accumulated over the events inside one observation window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityTotals {
    pub active_days_total: u32,
    pub features_total: u32,
    pub tickets_weighted_total: f64,
    pub invoices_total: u32,
    pub late_count_total: u32,
}

impl ActivityTotals {
    pub fn collect<'a>(
        events: impl IntoIterator<Item = &'a Event>,
        window: &ObservationWindow,
        config: &ScoringConfig,
    ) -> Self {
        let mut active_days: BTreeSet<NaiveDate> = BTreeSet::new();
        let mut features: BTreeSet<&str> = BTreeSet::new();
        let mut totals = ActivityTotals::default();

        for event in events {
            let day = event.occurred_on();
            if !window.contains(day) {
                continue;
            }

            match &event.kind {
                EventKind::Login => {
                    active_days.insert(day);
                }
                EventKind::FeatureUse { feature } => {
                    if let Some(feature) = feature.as_deref().map(str::trim) {
                        if !feature.is_empty() {
                            features.insert(feature);
                        }
                    }
                }
                EventKind::TicketOpened { severity } => {
                    totals.tickets_weighted_total += config.severity_weights.weight(*severity);
                }
                EventKind::InvoicePaid { days_late, on_time } => {
                    totals.invoices_total += 1;
                    if is_late(*days_late, *on_time) {
                        totals.late_count_total += 1;
                    }
                }
            }
        }

        totals.active_days_total = active_days.len() as u32;
        totals.features_total = features.len() as u32;
        totals
    }

    /// Normalizes the totals into per-horizon rates and the smoothed late ratio.
    pub fn rates(&self, observed_days: u32, config: &ScoringConfig) -> RateVector {
        let effective_days = f64::from(observed_days.max(1));
        let horizons = &config.horizons;
        let prior = &config.finance_prior;

        let finance_harm = if self.invoices_total == 0 {
            prior.baseline()
        } else {
            (f64::from(self.late_count_total) + prior.alpha)
                / (f64::from(self.invoices_total) + prior.alpha + prior.beta)
        };

        RateVector {
            engagement_rate_30: f64::from(self.active_days_total) / effective_days
                * horizons.engagement_days,
            adoption_rate_60: f64::from(self.features_total) / effective_days
                * horizons.adoption_days,
            support_rate_30: self.tickets_weighted_total / effective_days * horizons.support_days,
            finance_harm,
            invoices_total: self.invoices_total,
        }
    }
}

fn is_late(days_late: Option<u32>, on_time: Option<bool>) -> bool {
    days_late.is_some_and(|days| days > 0) || on_time == Some(false)
}

/// Aggregates one customer's events into its rate vector.
pub fn aggregate_rates<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    window: &ObservationWindow,
    config: &ScoringConfig,
) -> RateVector {
    ActivityTotals::collect(events, window, config).rates(window.observed_days, config)
}
