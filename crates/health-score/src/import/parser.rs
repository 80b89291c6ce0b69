use crate::scoring::domain::{Customer, CustomerId, Event, EventKind, Severity};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::PopulationImportError;

pub(crate) fn parse_customers<R: Read>(reader: R) -> Result<Vec<Customer>, PopulationImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut customers = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |position| position.line());
        let row: CustomerRow = record.deserialize(Some(&headers))?;
        customers.push(row.into_customer(line)?);
    }

    Ok(customers)
}

pub(crate) fn parse_events<R: Read>(reader: R) -> Result<Vec<Event>, PopulationImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut events = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |position| position.line());
        let row: EventRow = record.deserialize(Some(&headers))?;
        events.push(row.into_event(line)?);
    }

    Ok(events)
}

#[derive(Debug, Deserialize)]
struct CustomerRow {
    customer_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    segment: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    plan: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    join_date: Option<String>,
}

impl CustomerRow {
    fn into_customer(self, line: u64) -> Result<Customer, PopulationImportError> {
        if self.customer_id.is_empty() {
            return Err(PopulationImportError::InvalidRow {
                line,
                reason: "customer_id is empty".to_string(),
            });
        }

        let join_date = match self.join_date.as_deref() {
            Some(raw) => Some(parse_datetime(raw).map(|dt| dt.date()).ok_or_else(|| {
                PopulationImportError::InvalidRow {
                    line,
                    reason: format!("join_date '{raw}' is not a date"),
                }
            })?),
            None => None,
        };

        Ok(Customer {
            id: CustomerId(self.customer_id),
            join_date,
            name: self.name,
            segment: self.segment,
            plan: self.plan,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EventRow {
    customer_id: String,
    #[serde(rename = "type")]
    event_type: String,
    occurred_at: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    feature: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    severity: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    days_late: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    on_time: Option<String>,
}

impl EventRow {
    fn into_event(self, line: u64) -> Result<Event, PopulationImportError> {
        let invalid = |reason: String| PopulationImportError::InvalidRow { line, reason };

        let occurred_at = parse_datetime(&self.occurred_at).ok_or_else(|| {
            invalid(format!(
                "occurred_at '{}' is not a timestamp",
                self.occurred_at
            ))
        })?;

        let kind = match self.event_type.to_ascii_lowercase().as_str() {
            "login" => EventKind::Login,
            "feature_use" => EventKind::FeatureUse {
                feature: self.feature,
            },
            "ticket_opened" => EventKind::TicketOpened {
                severity: self.severity.as_deref().and_then(Severity::from_label),
            },
            "invoice_paid" => {
                let days_late = match self.days_late.as_deref() {
                    Some(raw) => Some(
                        raw.parse::<i64>()
                            .map(|days| days.clamp(0, i64::from(u32::MAX)) as u32)
                            .map_err(|_| invalid(format!("days_late '{raw}' is not an integer")))?,
                    ),
                    None => None,
                };
                let on_time = match self.on_time.as_deref() {
                    Some(raw) => Some(
                        parse_flag(raw)
                            .ok_or_else(|| invalid(format!("on_time '{raw}' is not a flag")))?,
                    ),
                    None => None,
                };
                EventKind::InvoicePaid { days_late, on_time }
            }
            other => return Err(invalid(format!("unknown event type '{other}'"))),
        };

        Ok(Event {
            customer_id: CustomerId(self.customer_id),
            occurred_at,
            kind,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}
