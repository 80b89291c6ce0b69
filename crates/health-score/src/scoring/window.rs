use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Effective observation window for one customer as of a scoring date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationWindow {
    pub start: NaiveDate,
    pub as_of: NaiveDate,
    pub observed_days: u32,
    /// Time-based trust in `[0, 1]`; reaches 1 after a full lookback of history.
    pub confidence: f64,
}

impl ObservationWindow {
    /// Derives the window from an optional join date. Missing or future join dates are treated
    /// as `as_of`, so the customer reads as having no proven history.
    pub fn derive(join_date: Option<NaiveDate>, as_of: NaiveDate, max_lookback_days: u32) -> Self {
        let max_lookback_days = max_lookback_days.max(1);
        let joined = join_date.map_or(as_of, |date| date.min(as_of));
        let lookback_start = as_of
            .checked_sub_signed(Duration::days(i64::from(max_lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        let start = joined.max(lookback_start);

        let span = (as_of - start).num_days().clamp(0, i64::from(max_lookback_days));
        let observed_days = (span as u32).max(1);
        let confidence = (f64::from(observed_days) / f64::from(max_lookback_days)).min(1.0);

        Self {
            start,
            as_of,
            observed_days,
            confidence,
        }
    }

    /// Half-open containment: `start <= day < as_of`.
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day < self.as_of
    }
}
