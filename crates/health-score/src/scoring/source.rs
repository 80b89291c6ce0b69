use chrono::NaiveDate;

use super::domain::PopulationSnapshot;

/// Upstream collaborator that captures a consistent population view for one scoring run.
///
/// Implementations return every active customer with its join date and the ordered events that
/// intersect `[as_of - lookback_days, as_of)`, or fail as a whole.
pub trait PopulationSource: Send + Sync {
    fn load_population(
        &self,
        as_of: NaiveDate,
        lookback_days: u32,
    ) -> Result<PopulationSnapshot, SourceError>;
}

/// Failure to capture a population snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Import(#[from] crate::import::PopulationImportError),
    #[error("population source unavailable: {0}")]
    Unavailable(String),
}
