use crate::infra::{csv_service, scoring_config, StaticPopulationSource};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use health_score::config::AppConfig;
use health_score::error::AppError;
use health_score::scoring::config::DEFAULT_MAX_LOOKBACK_DAYS;
use health_score::scoring::{
    Customer, CustomerId, Event, EventKind, HealthTier, PopulationSnapshot, Severity,
};
use health_score::service::{CustomerHealthView, HealthScoreService};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct ScoreArgs {
    /// Customer roster CSV (defaults to HEALTH_CUSTOMERS_CSV)
    #[arg(long)]
    pub(crate) customers: Option<PathBuf>,
    /// Activity event CSV (defaults to HEALTH_EVENTS_CSV)
    #[arg(long)]
    pub(crate) events: Option<PathBuf>,
    /// Scoring date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Score a single customer against the full population
    #[arg(long)]
    pub(crate) customer: Option<String>,
    /// Override the lookback window in days
    #[arg(long)]
    pub(crate) lookback_days: Option<u32>,
    /// Emit JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Scoring date for the synthetic population (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Print the per-metric breakdown for every customer
    #[arg(long)]
    pub(crate) breakdown: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        customers,
        events,
        as_of,
        customer,
        lookback_days,
        json,
    } = args;

    let mut population = AppConfig::load()?.population;
    if let Some(path) = customers {
        population.customers_csv = path;
    }
    if let Some(path) = events {
        population.events_csv = path;
    }
    if let Some(days) = lookback_days {
        population.lookback_days = days.max(1);
    }

    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let service = csv_service(&population);
    let views = match customer {
        Some(id) => vec![service.score_customer(as_of, &CustomerId::new(id))?],
        None => service.score_all(as_of)?,
    };

    if json {
        let rendered = serde_json::to_string_pretty(&views).map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    let source_label = format!(
        "{} + {}",
        population.customers_csv.display(),
        population.events_csv.display()
    );
    let breakdown = views.len() == 1;
    render_health_report(&views, as_of, &source_label, breakdown);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { as_of, breakdown } = args;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

    println!("Customer health scoring demo");
    let views = score_synthetic_population(as_of)?;
    render_health_report(&views, as_of, "synthetic demo population", breakdown);
    Ok(())
}

pub(crate) fn score_synthetic_population(
    as_of: NaiveDate,
) -> Result<Vec<CustomerHealthView>, AppError> {
    let source = StaticPopulationSource::new(synthetic_population(as_of));
    let service = HealthScoreService::new(
        Arc::new(source),
        scoring_config(DEFAULT_MAX_LOOKBACK_DAYS),
    );
    Ok(service.score_all(as_of)?)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TierCounts {
    pub(crate) green: usize,
    pub(crate) yellow: usize,
    pub(crate) red: usize,
}

pub(crate) fn tier_counts(views: &[CustomerHealthView]) -> TierCounts {
    views
        .iter()
        .fold(TierCounts::default(), |mut counts, view| {
            match view.health_tier {
                HealthTier::Green => counts.green += 1,
                HealthTier::Yellow => counts.yellow += 1,
                HealthTier::Red => counts.red += 1,
            }
            counts
        })
}

/// Lowest-scoring customers first, ties broken by id.
pub(crate) fn at_risk(views: &[CustomerHealthView], limit: usize) -> Vec<&CustomerHealthView> {
    let mut ranked: Vec<&CustomerHealthView> = views
        .iter()
        .filter(|view| view.health_tier == HealthTier::Red)
        .collect();
    ranked.sort_by(|left, right| {
        left.health_score
            .cmp(&right.health_score)
            .then_with(|| left.customer_id.cmp(&right.customer_id))
    });
    ranked.truncate(limit);
    ranked
}

pub(crate) fn render_health_report(
    views: &[CustomerHealthView],
    as_of: NaiveDate,
    source_label: &str,
    breakdown: bool,
) {
    println!("Customer health report (as of {as_of})");
    println!("Data source: {source_label}");

    if views.is_empty() {
        println!("\nNo active customers in the population.");
        return;
    }

    let counts = tier_counts(views);
    println!(
        "\n{} customers | {} Green | {} Yellow | {} Red",
        views.len(),
        counts.green,
        counts.yellow,
        counts.red
    );

    println!("\nScores");
    for view in views {
        println!(
            "- {} ({}): {} {} | logins {:.1}/30d | features {:.1}/60d | tickets {:.2}/30d \
             | late ratio {:.2} | confidence {:.0}%",
            view.display_name(),
            view.customer_id,
            view.health_score,
            view.health_tier,
            view.metrics.engagement_rate_30,
            view.metrics.adoption_rate_60,
            view.metrics.support_rate_30,
            view.metrics.finance_harm,
            view.confidence.engagement * 100.0
        );

        if breakdown {
            for component in &view.components {
                println!(
                    "    - {}: raw {:.2} -> shrunk {:.2} \
                     (confidence {:.0}%, weight {:.2}, contribution {:.3})",
                    component.metric.label(),
                    component.raw_percentile,
                    component.percentile,
                    component.confidence * 100.0,
                    component.weight,
                    component.contribution
                );
            }
        }
    }

    let risky = at_risk(views, 3);
    if risky.is_empty() {
        println!("\nAt-risk customers: none");
    } else {
        println!("\nAt-risk customers");
        for view in risky {
            println!(
                "- {} scored {} (weakest signal: {})",
                view.display_name(),
                view.health_score,
                weakest_metric(view)
            );
        }
    }
}

fn weakest_metric(view: &CustomerHealthView) -> &'static str {
    view.components
        .iter()
        .min_by(|left, right| {
            left.percentile
                .total_cmp(&right.percentile)
                .then_with(|| left.metric.cmp(&right.metric))
        })
        .map_or("none", |component| component.metric.label())
}

struct DemoProfile {
    id: &'static str,
    name: &'static str,
    segment: &'static str,
    plan: &'static str,
    tenure_days: i64,
    login_every: i64,
    features: &'static [&'static str],
    tickets: &'static [Severity],
    invoice_days_late: &'static [u32],
}

const DEMO_PROFILES: &[DemoProfile] = &[
    DemoProfile {
        id: "demo-northwind",
        name: "Northwind Traders",
        segment: "enterprise",
        plan: "premium",
        tenure_days: 400,
        login_every: 1,
        features: &[
            "dashboards",
            "reports",
            "alerts",
            "exports",
            "api",
            "sso",
            "audit_log",
            "forecasting",
        ],
        tickets: &[Severity::Low],
        invoice_days_late: &[0, 0, 0],
    },
    DemoProfile {
        id: "demo-contoso",
        name: "Contoso Retail",
        segment: "mid-market",
        plan: "growth",
        tenure_days: 300,
        login_every: 2,
        features: &["dashboards", "reports", "alerts", "exports", "integrations"],
        tickets: &[Severity::Medium],
        invoice_days_late: &[0, 0, 0],
    },
    DemoProfile {
        id: "demo-fabrikam",
        name: "Fabrikam Manufacturing",
        segment: "enterprise",
        plan: "premium",
        tenure_days: 250,
        login_every: 3,
        features: &["dashboards", "reports", "api", "sso"],
        tickets: &[Severity::Low, Severity::Medium],
        invoice_days_late: &[0, 5, 0],
    },
    DemoProfile {
        id: "demo-tailspin",
        name: "Tailspin Toys",
        segment: "smb",
        plan: "starter",
        tenure_days: 500,
        login_every: 7,
        features: &["dashboards", "exports"],
        tickets: &[Severity::High, Severity::Critical, Severity::High],
        invoice_days_late: &[12, 9, 0],
    },
    DemoProfile {
        id: "demo-wingtip",
        name: "Wingtip Travel",
        segment: "smb",
        plan: "starter",
        tenure_days: 200,
        login_every: 10,
        features: &["dashboards"],
        tickets: &[Severity::Critical, Severity::Critical, Severity::High, Severity::Medium],
        invoice_days_late: &[20, 15, 30],
    },
    DemoProfile {
        id: "demo-adatum",
        name: "Adatum Health",
        segment: "mid-market",
        plan: "growth",
        tenure_days: 14,
        login_every: 1,
        features: &["dashboards", "reports", "alerts"],
        tickets: &[],
        invoice_days_late: &[],
    },
    DemoProfile {
        id: "demo-litware",
        name: "Litware Labs",
        segment: "smb",
        plan: "starter",
        tenure_days: 0,
        login_every: 0,
        features: &[],
        tickets: &[],
        invoice_days_late: &[],
    },
    DemoProfile {
        id: "demo-proseware",
        name: "Proseware Publishing",
        segment: "mid-market",
        plan: "growth",
        tenure_days: 120,
        login_every: 4,
        features: &["dashboards", "reports", "exports"],
        tickets: &[],
        invoice_days_late: &[0, 0, 2],
    },
];

/// Deterministic population spanning every tier, with one customer joining on `as_of`.
pub(crate) fn synthetic_population(as_of: NaiveDate) -> PopulationSnapshot {
    let mut snapshot = PopulationSnapshot::new();
    for profile in DEMO_PROFILES {
        let customer = Customer {
            name: Some(profile.name.to_string()),
            segment: Some(profile.segment.to_string()),
            plan: Some(profile.plan.to_string()),
            ..Customer::new(profile.id, Some(as_of - Duration::days(profile.tenure_days)))
        };
        snapshot.insert(customer, demo_events(profile, as_of));
    }
    snapshot
}

fn demo_events(profile: &DemoProfile, as_of: NaiveDate) -> Vec<Event> {
    let observed = profile
        .tenure_days
        .min(i64::from(DEFAULT_MAX_LOOKBACK_DAYS));
    let event = |days_ago: i64, hour: u32, kind: EventKind| -> Option<Event> {
        if days_ago < 1 || days_ago > observed {
            return None;
        }
        let occurred_at = (as_of - Duration::days(days_ago)).and_hms_opt(hour, 0, 0)?;
        Some(Event {
            customer_id: CustomerId::new(profile.id),
            occurred_at,
            kind,
        })
    };

    let mut events = Vec::new();
    if profile.login_every > 0 {
        events.extend(
            (1..=observed)
                .filter(|days_ago| days_ago % profile.login_every == 0)
                .filter_map(|days_ago| event(days_ago, 9, EventKind::Login)),
        );
    }
    events.extend(profile.features.iter().zip(1i64..).filter_map(|(feature, days_ago)| {
        event(
            days_ago,
            11,
            EventKind::FeatureUse {
                feature: Some((*feature).to_string()),
            },
        )
    }));
    events.extend(profile.tickets.iter().zip(0i64..).filter_map(|(severity, index)| {
        event(
            2 * index + 3,
            14,
            EventKind::TicketOpened {
                severity: Some(*severity),
            },
        )
    }));
    events.extend(
        profile
            .invoice_days_late
            .iter()
            .zip(0i64..)
            .filter_map(|(days_late, index)| {
                event(
                    30 * index + 5,
                    16,
                    EventKind::InvoicePaid {
                        days_late: Some(*days_late),
                        on_time: Some(*days_late == 0),
                    },
                )
            }),
    );
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid as_of")
    }

    fn find<'a>(views: &'a [CustomerHealthView], id: &str) -> &'a CustomerHealthView {
        views
            .iter()
            .find(|view| view.customer_id.as_str() == id)
            .expect("customer scored")
    }

    #[test]
    fn synthetic_population_covers_every_profile() {
        let snapshot = synthetic_population(as_of());

        assert_eq!(snapshot.len(), DEMO_PROFILES.len());
        let litware = snapshot
            .get(&CustomerId::new("demo-litware"))
            .expect("litware present");
        assert!(litware.events.is_empty());
        assert_eq!(litware.customer.join_date, Some(as_of()));
    }

    #[test]
    fn synthetic_population_spans_tiers() {
        let views = score_synthetic_population(as_of()).expect("demo scores");
        let counts = tier_counts(&views);

        assert_eq!(counts.green + counts.yellow + counts.red, views.len());
        assert!(counts.green >= 1);
        assert!(counts.red >= 1);
        assert_eq!(find(&views, "demo-northwind").health_tier, HealthTier::Green);
        assert_eq!(find(&views, "demo-wingtip").health_tier, HealthTier::Red);
    }

    #[test]
    fn joining_customer_scores_neutral() {
        let views = score_synthetic_population(as_of()).expect("demo scores");
        let litware = find(&views, "demo-litware");

        assert_eq!(litware.health_score, 65);
        assert_eq!(litware.health_tier, HealthTier::Yellow);
    }

    #[test]
    fn at_risk_lists_red_customers_lowest_first() {
        let views = score_synthetic_population(as_of()).expect("demo scores");
        let risky = at_risk(&views, 3);

        assert!(!risky.is_empty());
        assert_eq!(risky[0].customer_id.as_str(), "demo-wingtip");
        assert!(risky
            .windows(2)
            .all(|pair| pair[0].health_score <= pair[1].health_score));
        assert!(risky
            .iter()
            .all(|view| view.health_tier == HealthTier::Red));
    }
}
