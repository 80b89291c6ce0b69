use serde::{Deserialize, Serialize};

use super::domain::{HealthTier, Metric, Severity};

pub const DEFAULT_MAX_LOOKBACK_DAYS: u32 = 90;

/// Tunable tables driving every stage of a scoring run.
///
/// The standard values are pinned: expected outputs are validated against them, so they should
/// not be re-derived when tuning a single stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub max_lookback_days: u32,
    pub horizons: RateHorizons,
    pub severity_weights: SeverityWeights,
    pub finance_prior: FinancePrior,
    pub weights: CombinerWeights,
    pub floor_lift: FloorLift,
    pub tiers: TierThresholds,
}

impl ScoringConfig {
    pub fn standard() -> Self {
        Self {
            max_lookback_days: DEFAULT_MAX_LOOKBACK_DAYS,
            horizons: RateHorizons {
                engagement_days: 30.0,
                adoption_days: 60.0,
                support_days: 30.0,
            },
            severity_weights: SeverityWeights {
                low: 0.25,
                medium: 0.50,
                high: 0.75,
                critical: 1.00,
                unknown: 0.25,
            },
            finance_prior: FinancePrior {
                alpha: 1.0,
                beta: 3.0,
                trusted_invoice_count: 3,
            },
            weights: CombinerWeights {
                engagement: 0.35,
                adoption: 0.30,
                support: 0.20,
                finance: 0.15,
            },
            floor_lift: FloorLift {
                floor: 0.30,
                span: 0.70,
            },
            tiers: TierThresholds {
                green_min: 80,
                yellow_min: 60,
            },
        }
    }

    pub fn with_max_lookback_days(mut self, days: u32) -> Self {
        self.max_lookback_days = days.max(1);
        self
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Per-unit horizon each rate is expressed over (e.g. "active days per 30 days").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateHorizons {
    pub engagement_days: f64,
    pub adoption_days: f64,
    pub support_days: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityWeights {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
    pub unknown: f64,
}

impl SeverityWeights {
    pub fn weight(&self, severity: Option<Severity>) -> f64 {
        match severity {
            Some(Severity::Low) => self.low,
            Some(Severity::Medium) => self.medium,
            Some(Severity::High) => self.high,
            Some(Severity::Critical) => self.critical,
            None => self.unknown,
        }
    }
}

/// Beta-style prior for the late-payment ratio plus the invoice count needed for full trust.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancePrior {
    pub alpha: f64,
    pub beta: f64,
    pub trusted_invoice_count: u32,
}

impl FinancePrior {
    /// Late ratio the finance metric reports before any invoice is observed.
    pub fn baseline(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinerWeights {
    pub engagement: f64,
    pub adoption: f64,
    pub support: f64,
    pub finance: f64,
}

impl CombinerWeights {
    pub fn weight(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Engagement => self.engagement,
            Metric::Adoption => self.adoption,
            Metric::Support => self.support,
            Metric::Finance => self.finance,
        }
    }

    pub fn total(&self) -> f64 {
        Metric::ALL.iter().map(|metric| self.weight(*metric)).sum()
    }
}

/// Affine rescale keeping the lowest combined percentile at `floor` instead of zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorLift {
    pub floor: f64,
    pub span: f64,
}

impl FloorLift {
    pub fn apply(&self, combined: f64) -> f64 {
        self.floor + self.span * combined
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub green_min: u8,
    pub yellow_min: u8,
}

impl TierThresholds {
    pub fn classify(&self, score: u8) -> HealthTier {
        if score >= self.green_min {
            HealthTier::Green
        } else if score >= self.yellow_min {
            HealthTier::Yellow
        } else {
            HealthTier::Red
        }
    }
}
