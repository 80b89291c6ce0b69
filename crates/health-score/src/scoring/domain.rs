use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for scored customers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Roster entry for a customer. Only `id` and `join_date` influence scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub join_date: Option<NaiveDate>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
}

impl Customer {
    pub fn new(id: impl Into<String>, join_date: Option<NaiveDate>) -> Self {
        Self {
            id: CustomerId::new(id),
            join_date,
            name: None,
            segment: None,
            plan: None,
        }
    }
}

/// Ticket severity reported on `ticket_opened` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Case-insensitive lookup; unrecognized labels yield `None`.
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Event type with its per-type payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Login,
    FeatureUse {
        feature: Option<String>,
    },
    TicketOpened {
        severity: Option<Severity>,
    },
    InvoicePaid {
        days_late: Option<u32>,
        on_time: Option<bool>,
    },
}

impl EventKind {
    pub const fn label(&self) -> &'static str {
        match self {
            EventKind::Login => "login",
            EventKind::FeatureUse { .. } => "feature_use",
            EventKind::TicketOpened { .. } => "ticket_opened",
            EventKind::InvoicePaid { .. } => "invoice_paid",
        }
    }
}

/// Immutable activity record owned by the upstream event store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub customer_id: CustomerId,
    pub occurred_at: NaiveDateTime,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn occurred_on(&self) -> NaiveDate {
        self.occurred_at.date()
    }
}

/// A customer together with every event captured for it in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerHistory {
    pub customer: Customer,
    pub events: Vec<Event>,
}

/// Point-in-time population handed to a single scoring run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    histories: BTreeMap<CustomerId, CustomerHistory>,
}

impl PopulationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups `events` under the roster. Events for customers missing from the roster are
    /// dropped; duplicate roster entries keep the first profile.
    pub fn from_parts(customers: Vec<Customer>, events: Vec<Event>) -> Self {
        let mut snapshot = Self::new();
        for customer in customers {
            snapshot.insert(customer, Vec::new());
        }

        let mut orphaned = 0usize;
        for event in events {
            match snapshot.histories.get_mut(&event.customer_id) {
                Some(history) => history.events.push(event),
                None => orphaned += 1,
            }
        }

        if orphaned > 0 {
            tracing::warn!(orphaned, "dropped events for customers outside the roster");
        }

        for history in snapshot.histories.values_mut() {
            history.events.sort_by_key(|event| event.occurred_at);
        }

        snapshot
    }

    /// Adds a customer, merging events into an existing entry with the same id. Events stay
    /// ordered by occurrence either way.
    pub fn insert(&mut self, customer: Customer, events: Vec<Event>) {
        let history = self
            .histories
            .entry(customer.id.clone())
            .or_insert_with(|| CustomerHistory {
                customer,
                events: Vec::new(),
            });
        history.events.extend(events);
        history.events.sort_by_key(|event| event.occurred_at);
    }

    pub fn get(&self, id: &CustomerId) -> Option<&CustomerHistory> {
        self.histories.get(id)
    }

    pub fn contains(&self, id: &CustomerId) -> bool {
        self.histories.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Histories in ascending customer id order.
    pub fn histories(&self) -> impl Iterator<Item = &CustomerHistory> {
        self.histories.values()
    }
}

/// Time-normalized activity rates derived for one customer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateVector {
    pub engagement_rate_30: f64,
    pub adoption_rate_60: f64,
    pub support_rate_30: f64,
    pub finance_harm: f64,
    pub invoices_total: u32,
}

/// One value per scored metric, in engagement/adoption/support/finance order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileVector {
    pub engagement: f64,
    pub adoption: f64,
    pub support: f64,
    pub finance: f64,
}

impl PercentileVector {
    pub const NEUTRAL: PercentileVector = PercentileVector {
        engagement: 0.5,
        adoption: 0.5,
        support: 0.5,
        finance: 0.5,
    };

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Engagement => self.engagement,
            Metric::Adoption => self.adoption,
            Metric::Support => self.support,
            Metric::Finance => self.finance,
        }
    }

    pub fn from_fn(mut value: impl FnMut(Metric) -> f64) -> Self {
        Self {
            engagement: value(Metric::Engagement),
            adoption: value(Metric::Adoption),
            support: value(Metric::Support),
            finance: value(Metric::Finance),
        }
    }
}

/// Per-metric confidence weights, each in `[0, 1]`.
pub type ConfidenceVector = PercentileVector;

/// The four scored health dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Engagement,
    Adoption,
    Support,
    Finance,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Engagement,
        Metric::Adoption,
        Metric::Support,
        Metric::Finance,
    ];

    pub const fn polarity(self) -> Polarity {
        match self {
            Metric::Engagement | Metric::Adoption => Polarity::Benefit,
            Metric::Support | Metric::Finance => Polarity::Harm,
        }
    }

    pub fn raw_value(self, rates: &RateVector) -> f64 {
        match self {
            Metric::Engagement => rates.engagement_rate_30,
            Metric::Adoption => rates.adoption_rate_60,
            Metric::Support => rates.support_rate_30,
            Metric::Finance => rates.finance_harm,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Metric::Engagement => "engagement",
            Metric::Adoption => "adoption",
            Metric::Support => "support",
            Metric::Finance => "finance",
        }
    }
}

/// Whether a higher raw value is better (`Benefit`) or worse (`Harm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Benefit,
    Harm,
}

/// Coarse risk bucket derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthTier {
    Green,
    Yellow,
    Red,
}

impl HealthTier {
    pub const fn label(self) -> &'static str {
        match self {
            HealthTier::Green => "Green",
            HealthTier::Yellow => "Yellow",
            HealthTier::Red => "Red",
        }
    }
}

impl fmt::Display for HealthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Discrete contribution of one metric to the final score, kept for audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub metric: Metric,
    pub raw_percentile: f64,
    pub confidence: f64,
    pub percentile: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Engine output for one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCustomer {
    pub customer_id: CustomerId,
    pub score: u8,
    pub tier: HealthTier,
    pub rates: RateVector,
    /// Shrunk percentiles fed into the combiner.
    pub percentiles: PercentileVector,
    pub raw_percentiles: PercentileVector,
    pub confidence: ConfidenceVector,
    pub components: Vec<ScoreComponent>,
}
