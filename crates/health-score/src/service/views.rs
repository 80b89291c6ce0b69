use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::scoring::{
    ConfidenceVector, CustomerHistory, CustomerId, HealthTier, PercentileVector, RateVector,
    ScoreComponent, ScoredCustomer,
};

/// Customer profile joined with its scoring outcome for API and CLI responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerHealthView {
    pub customer_id: CustomerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub as_of: NaiveDate,
    /// Latest event strictly before `as_of`, whatever its kind.
    pub last_activity_at: Option<NaiveDateTime>,
    pub health_score: u8,
    pub health_tier: HealthTier,
    pub metrics: RateVector,
    pub percentiles: PercentileVector,
    pub raw_percentiles: PercentileVector,
    pub confidence: ConfidenceVector,
    pub components: Vec<ScoreComponent>,
}

impl CustomerHealthView {
    pub fn new(history: &CustomerHistory, scored: ScoredCustomer, as_of: NaiveDate) -> Self {
        let customer = &history.customer;
        let last_activity_at = history
            .events
            .iter()
            .filter(|event| event.occurred_on() < as_of)
            .map(|event| event.occurred_at)
            .max();

        Self {
            customer_id: scored.customer_id,
            name: customer.name.clone(),
            segment: customer.segment.clone(),
            plan: customer.plan.clone(),
            join_date: customer.join_date,
            as_of,
            last_activity_at,
            health_score: scored.score,
            health_tier: scored.tier,
            metrics: scored.rates,
            percentiles: scored.percentiles,
            raw_percentiles: scored.raw_percentiles,
            confidence: scored.confidence,
            components: scored.components,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.customer_id.as_str())
    }
}

/// One monthly point of a customer's score trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthHistoryPoint {
    pub as_of: NaiveDate,
    pub health_score: u8,
    pub health_tier: HealthTier,
}

impl HealthHistoryPoint {
    pub fn new(scored: &ScoredCustomer, as_of: NaiveDate) -> Self {
        Self {
            as_of,
            health_score: scored.score,
            health_tier: scored.tier,
        }
    }
}

/// Score trend for one customer, most recent point first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerHealthHistory {
    pub customer_id: CustomerId,
    pub as_of: NaiveDate,
    pub history: Vec<HealthHistoryPoint>,
}
