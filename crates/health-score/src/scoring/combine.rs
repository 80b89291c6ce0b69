use super::config::ScoringConfig;
use super::domain::{HealthTier, Metric, PercentileVector};

/// Weighted sum of shrunk percentiles, lifted onto the `[floor, 1]` band and scaled to 0..=100.
pub fn combine_with(config: &ScoringConfig, percentiles: &PercentileVector) -> u8 {
    let combined: f64 = Metric::ALL
        .iter()
        .map(|metric| config.weights.weight(*metric) * percentiles.get(*metric))
        .sum();
    let shifted = config.floor_lift.apply(combined).clamp(0.0, 1.0);
    (100.0 * shifted).round() as u8
}

/// Combines the four percentiles with the standard weights.
pub fn combine_score(engagement: f64, adoption: f64, support: f64, finance: f64) -> u8 {
    let percentiles = PercentileVector {
        engagement,
        adoption,
        support,
        finance,
    };
    combine_with(&ScoringConfig::standard(), &percentiles)
}

/// Classifies a score with the standard tier thresholds.
pub fn tier(score: u8) -> HealthTier {
    ScoringConfig::standard().tiers.classify(score)
}
