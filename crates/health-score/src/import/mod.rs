//! CSV-backed population source for customer roster and activity event exports.

mod parser;

use crate::scoring::domain::PopulationSnapshot;
use crate::scoring::source::{PopulationSource, SourceError};
use chrono::{Duration, NaiveDate};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub enum PopulationImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
}

impl std::fmt::Display for PopulationImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PopulationImportError::Io(err) => {
                write!(f, "failed to read population export: {}", err)
            }
            PopulationImportError::Csv(err) => write!(f, "invalid population CSV data: {}", err),
            PopulationImportError::InvalidRow { line, reason } => {
                write!(f, "invalid population row at line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for PopulationImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PopulationImportError::Io(err) => Some(err),
            PopulationImportError::Csv(err) => Some(err),
            PopulationImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for PopulationImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PopulationImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct PopulationImporter;

impl PopulationImporter {
    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        customers: P,
        events: Q,
        as_of: NaiveDate,
        lookback_days: u32,
    ) -> Result<PopulationSnapshot, PopulationImportError> {
        let customers = std::fs::File::open(customers)?;
        let events = std::fs::File::open(events)?;
        Self::from_readers(customers, events, as_of, lookback_days)
    }

    /// Reads both exports and keeps events whose day falls in `[as_of - lookback_days, as_of)`.
    pub fn from_readers<C: Read, E: Read>(
        customers: C,
        events: E,
        as_of: NaiveDate,
        lookback_days: u32,
    ) -> Result<PopulationSnapshot, PopulationImportError> {
        let customers = parser::parse_customers(customers)?;
        let lookback_start = as_of
            .checked_sub_signed(Duration::days(i64::from(lookback_days)))
            .unwrap_or(NaiveDate::MIN);

        let events: Vec<_> = parser::parse_events(events)?
            .into_iter()
            .filter(|event| {
                let day = event.occurred_on();
                day >= lookback_start && day < as_of
            })
            .collect();

        Ok(PopulationSnapshot::from_parts(customers, events))
    }
}

/// [`PopulationSource`] reading a customer roster export and an event export from disk.
///
/// Both files are re-read on every load, so each scoring run sees the exports as they are at
/// that moment.
#[derive(Debug, Clone)]
pub struct CsvPopulationSource {
    customers_path: PathBuf,
    events_path: PathBuf,
}

impl CsvPopulationSource {
    pub fn new(customers_path: impl Into<PathBuf>, events_path: impl Into<PathBuf>) -> Self {
        Self {
            customers_path: customers_path.into(),
            events_path: events_path.into(),
        }
    }

    pub fn customers_path(&self) -> &Path {
        &self.customers_path
    }

    pub fn events_path(&self) -> &Path {
        &self.events_path
    }
}

impl PopulationSource for CsvPopulationSource {
    fn load_population(
        &self,
        as_of: NaiveDate,
        lookback_days: u32,
    ) -> Result<PopulationSnapshot, SourceError> {
        let snapshot = PopulationImporter::from_paths(
            &self.customers_path,
            &self.events_path,
            as_of,
            lookback_days,
        )?;
        info!(
            customers = snapshot.len(),
            %as_of,
            lookback_days,
            "loaded population snapshot from csv exports"
        );
        Ok(snapshot)
    }
}
