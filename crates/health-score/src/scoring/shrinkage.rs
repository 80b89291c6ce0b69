use super::config::FinancePrior;

const NEUTRAL_PERCENTILE: f64 = 0.5;

/// Blends a raw percentile toward the neutral midpoint in proportion to missing confidence.
pub fn shrink(raw_percentile: f64, confidence: f64) -> f64 {
    let confidence = confidence.clamp(0.0, 1.0);
    (1.0 - confidence) * NEUTRAL_PERCENTILE + confidence * raw_percentile
}

/// Count-based confidence for the finance metric: full trust once enough invoices are observed.
pub fn finance_confidence(invoices_total: u32, prior: &FinancePrior) -> f64 {
    let trusted = prior.trusted_invoice_count.max(1);
    (f64::from(invoices_total) / f64::from(trusted)).min(1.0)
}
