use std::collections::BTreeMap;

use super::domain::{CustomerId, Polarity};

/// Ranks a whole population's values for one metric using midrank percentiles.
///
/// Ties share the mean of the 1-indexed positions they occupy, and every percentile is
/// `midrank / (n + 1)`, so results stay strictly inside `(0, 1)`. `Harm` metrics are inverted so
/// a lower raw value yields a higher percentile.
pub fn midrank_percentiles(
    values: BTreeMap<CustomerId, f64>,
    polarity: Polarity,
) -> BTreeMap<CustomerId, f64> {
    let mut ordered: Vec<(CustomerId, f64)> = values.into_iter().collect();
    ordered.sort_by(|(left_id, left), (right_id, right)| {
        left.total_cmp(right).then_with(|| left_id.cmp(right_id))
    });

    let n = ordered.len();
    let denominator = (n + 1) as f64;
    let mut percentiles = BTreeMap::new();

    let mut run_start = 0;
    while run_start < n {
        let value = ordered[run_start].1;
        let mut run_end = run_start;
        while run_end + 1 < n && ordered[run_end + 1].1 == value {
            run_end += 1;
        }

        // positions are 1-indexed: run covers run_start + 1 ..= run_end + 1
        let midrank = (run_start + run_end + 2) as f64 / 2.0;
        let raw = midrank / denominator;
        let percentile = match polarity {
            Polarity::Benefit => raw,
            Polarity::Harm => 1.0 - raw,
        };

        for (id, _) in &ordered[run_start..=run_end] {
            percentiles.insert(id.clone(), percentile);
        }

        run_start = run_end + 1;
    }

    percentiles
}
