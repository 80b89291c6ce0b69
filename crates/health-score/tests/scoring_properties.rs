use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use health_score::scoring::{
    combine_score, midrank_percentiles, score_population, shrink, Customer, CustomerId, Event,
    EventKind, Polarity, PopulationSnapshot,
};
use proptest::prelude::*;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid as_of")
}

fn population(values: &[u16]) -> BTreeMap<CustomerId, f64> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| (CustomerId::new(format!("c{index:03}")), f64::from(*value)))
        .collect()
}

fn unit() -> impl Strategy<Value = f64> {
    0.0f64..=1.0
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn percentiles_stay_inside_open_unit_interval(
        values in prop::collection::vec(0u16..50, 1..40)
    ) {
        for polarity in [Polarity::Benefit, Polarity::Harm] {
            let ranked = midrank_percentiles(population(&values), polarity);
            prop_assert_eq!(ranked.len(), values.len());
            for percentile in ranked.values() {
                prop_assert!(*percentile > 0.0 && *percentile < 1.0);
            }
        }
    }

    #[test]
    fn equal_values_share_a_percentile(values in prop::collection::vec(0u16..8, 2..30)) {
        let input = population(&values);
        let ranked = midrank_percentiles(input.clone(), Polarity::Benefit);

        for (left_id, left_value) in &input {
            for (right_id, right_value) in &input {
                if left_value == right_value {
                    prop_assert_eq!(ranked[left_id], ranked[right_id]);
                } else if left_value < right_value {
                    prop_assert!(ranked[left_id] < ranked[right_id]);
                }
            }
        }
    }

    #[test]
    fn harm_polarity_mirrors_benefit(values in prop::collection::vec(0u16..50, 1..30)) {
        let benefit = midrank_percentiles(population(&values), Polarity::Benefit);
        let harm = midrank_percentiles(population(&values), Polarity::Harm);

        for (id, percentile) in &benefit {
            prop_assert!((percentile + harm[id] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn shrinkage_moves_toward_the_midpoint(raw in unit(), confidence in unit()) {
        let shrunk = shrink(raw, confidence);

        prop_assert!((shrunk - 0.5).abs() <= (raw - 0.5).abs() + 1e-12);
    }

    #[test]
    fn combined_score_is_bounded(e in unit(), a in unit(), s in unit(), f in unit()) {
        let score = combine_score(e, a, s, f);

        prop_assert!((30..=100).contains(&score));
    }

    #[test]
    fn combined_score_is_monotonic(
        e in unit(),
        a in unit(),
        s in unit(),
        f in unit(),
        bump in unit()
    ) {
        let raised = (e + bump).min(1.0);

        prop_assert!(combine_score(raised, a, s, f) >= combine_score(e, a, s, f));
    }

    #[test]
    fn population_scores_are_deterministic(active_days in prop::collection::vec(0i64..90, 1..12)) {
        let mut snapshot = PopulationSnapshot::new();
        for (index, days) in active_days.iter().enumerate() {
            let id = format!("c{index:02}");
            let events = (1..=*days)
                .map(|offset| Event {
                    customer_id: CustomerId::new(id.clone()),
                    occurred_at: (as_of() - Duration::days(offset))
                        .and_hms_opt(8, 0, 0)
                        .expect("valid time"),
                    kind: EventKind::Login,
                })
                .collect();
            snapshot.insert(Customer::new(id, Some(as_of() - Duration::days(200))), events);
        }

        let first = score_population(&snapshot, as_of());
        let second = score_population(&snapshot, as_of());

        prop_assert_eq!(first.len(), active_days.len());
        prop_assert_eq!(&first, &second);
        for customer in &first {
            prop_assert!((30..=100).contains(&customer.score));
        }
    }
}
