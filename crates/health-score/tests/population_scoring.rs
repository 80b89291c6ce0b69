use chrono::{Duration, NaiveDate};
use health_score::scoring::{
    score_one, score_population, Customer, CustomerId, Event, EventKind, HealthTier,
    PopulationSnapshot, ScoringError, Severity,
};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid as_of")
}

fn tenured(id: &str) -> Customer {
    Customer::new(id, Some(as_of() - Duration::days(365)))
}

fn event(id: &str, days_ago: i64, kind: EventKind) -> Event {
    Event {
        customer_id: CustomerId::new(id),
        occurred_at: (as_of() - Duration::days(days_ago))
            .and_hms_opt(12, 0, 0)
            .expect("valid time"),
        kind,
    }
}

fn logins(id: &str, active_days: i64) -> Vec<Event> {
    (1..=active_days)
        .map(|days_ago| event(id, days_ago, EventKind::Login))
        .collect()
}

fn find<'a>(
    scored: &'a [health_score::scoring::ScoredCustomer],
    id: &str,
) -> &'a health_score::scoring::ScoredCustomer {
    scored
        .iter()
        .find(|customer| customer.customer_id.as_str() == id)
        .expect("customer scored")
}

#[test]
fn tied_engagement_rates_share_a_midrank() {
    let mut snapshot = PopulationSnapshot::new();
    // 15, 30, 30 and 60 active days over 90 observed days give rates of 5, 10, 10 and 20.
    for (id, days) in [("a", 15), ("b", 30), ("c", 30), ("d", 60)] {
        snapshot.insert(tenured(id), logins(id, days));
    }

    let scored = score_population(&snapshot, as_of());

    let engagement = |id: &str| find(&scored, id).raw_percentiles.engagement;
    assert!((engagement("a") - 0.2).abs() < 1e-12);
    assert!((engagement("b") - 0.5).abs() < 1e-12);
    assert!((engagement("c") - 0.5).abs() < 1e-12);
    assert!((engagement("d") - 0.8).abs() < 1e-12);
    assert_eq!(find(&scored, "b").score, find(&scored, "c").score);
    assert!((find(&scored, "d").rates.engagement_rate_30 - 20.0).abs() < 1e-9);
}

#[test]
fn brand_new_customer_scores_neutral_yellow() {
    let mut snapshot = PopulationSnapshot::new();
    snapshot.insert(Customer::new("fresh", Some(as_of())), Vec::new());

    let scored = score_population(&snapshot, as_of());

    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].score, 65);
    assert_eq!(scored[0].tier, HealthTier::Yellow);
}

#[test]
fn new_customer_in_an_established_population_stays_near_neutral() {
    let mut snapshot = PopulationSnapshot::new();
    snapshot.insert(tenured("veteran"), logins("veteran", 80));
    snapshot.insert(tenured("quiet"), Vec::new());
    snapshot.insert(Customer::new("fresh", Some(as_of())), Vec::new());

    let scored = score_population(&snapshot, as_of());
    let fresh = find(&scored, "fresh");

    assert!((64..=66).contains(&fresh.score), "score was {}", fresh.score);
    assert_eq!(fresh.tier, HealthTier::Yellow);
}

#[test]
fn invoices_total_of_zero_pins_finance_to_midpoint() {
    let mut snapshot = PopulationSnapshot::new();
    snapshot.insert(tenured("no-bills"), logins("no-bills", 20));
    snapshot.insert(
        tenured("late-payer"),
        (1..=4)
            .map(|n| {
                event(
                    "late-payer",
                    n * 15,
                    EventKind::InvoicePaid {
                        days_late: Some(12),
                        on_time: None,
                    },
                )
            })
            .collect(),
    );

    let scored = score_population(&snapshot, as_of());
    let no_bills = find(&scored, "no-bills");

    assert_eq!(no_bills.rates.invoices_total, 0);
    assert_eq!(no_bills.confidence.finance, 0.0);
    assert_eq!(no_bills.percentiles.finance, 0.5);
}

#[test]
fn late_payments_lower_the_finance_percentile() {
    let mut snapshot = PopulationSnapshot::new();
    let invoices = |id: &str, late: bool| -> Vec<Event> {
        (1..=4)
            .map(|n| {
                event(
                    id,
                    n * 20,
                    EventKind::InvoicePaid {
                        days_late: None,
                        on_time: Some(!late),
                    },
                )
            })
            .collect()
    };
    snapshot.insert(tenured("prompt"), invoices("prompt", false));
    snapshot.insert(tenured("slow"), invoices("slow", true));

    let scored = score_population(&snapshot, as_of());
    let prompt = find(&scored, "prompt");
    let slow = find(&scored, "slow");

    assert!((prompt.rates.finance_harm - 0.125).abs() < 1e-12);
    assert!((slow.rates.finance_harm - 0.625).abs() < 1e-12);
    assert!(prompt.percentiles.finance > slow.percentiles.finance);
    assert!(prompt.score > slow.score);
}

#[test]
fn severe_tickets_count_against_support() {
    let mut snapshot = PopulationSnapshot::new();
    snapshot.insert(
        tenured("calm"),
        vec![event(
            "calm",
            10,
            EventKind::TicketOpened {
                severity: Some(Severity::Low),
            },
        )],
    );
    snapshot.insert(
        tenured("escalating"),
        vec![
            event(
                "escalating",
                10,
                EventKind::TicketOpened {
                    severity: Some(Severity::Critical),
                },
            ),
            event(
                "escalating",
                5,
                EventKind::TicketOpened {
                    severity: Some(Severity::High),
                },
            ),
        ],
    );

    let scored = score_population(&snapshot, as_of());

    let calm = find(&scored, "calm");
    let escalating = find(&scored, "escalating");
    assert!(calm.percentiles.support > escalating.percentiles.support);
    assert!(calm.score > escalating.score);
}

#[test]
fn repeated_runs_are_identical() {
    let mut snapshot = PopulationSnapshot::new();
    snapshot.insert(tenured("a"), logins("a", 12));
    snapshot.insert(tenured("b"), logins("b", 44));
    snapshot.insert(Customer::new("c", None), logins("c", 3));

    let first = score_population(&snapshot, as_of());
    let second = score_population(&snapshot.clone(), as_of());

    assert_eq!(first, second);
}

#[test]
fn empty_population_scores_nothing() {
    let snapshot = PopulationSnapshot::new();

    assert!(score_population(&snapshot, as_of()).is_empty());
}

#[test]
fn unknown_customer_is_not_found() {
    let mut snapshot = PopulationSnapshot::new();
    snapshot.insert(tenured("a"), logins("a", 5));
    let missing = CustomerId::new("ghost");

    match score_one(&snapshot, as_of(), &missing) {
        Err(ScoringError::NotFound { customer_id }) => assert_eq!(customer_id, missing),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn orphaned_events_do_not_create_customers() {
    let customers = vec![tenured("known")];
    let mut events = logins("known", 4);
    events.extend(logins("stranger", 9));

    let snapshot = PopulationSnapshot::from_parts(customers, events);
    let scored = score_population(&snapshot, as_of());

    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].customer_id.as_str(), "known");
}

#[test]
fn merged_inserts_keep_events_in_time_order() {
    let mut snapshot = PopulationSnapshot::new();
    snapshot.insert(tenured("a"), vec![event("a", 2, EventKind::Login)]);
    snapshot.insert(
        tenured("a"),
        vec![
            event("a", 1, EventKind::Login),
            event("a", 9, EventKind::Login),
        ],
    );

    let history = snapshot.get(&CustomerId::new("a")).expect("history kept");
    let days_ago: Vec<i64> = history
        .events
        .iter()
        .map(|event| (as_of() - event.occurred_on()).num_days())
        .collect();
    assert_eq!(days_ago, vec![9, 2, 1]);
    assert_eq!(snapshot.len(), 1);
}
