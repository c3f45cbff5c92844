use chrono::{DateTime, Utc};
use kalends_core::types::SeriesId;
use thiserror::Error;

/// Store layer errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Series not found: {0}")]
    NotFound(SeriesId),

    #[error("Series already exists: {0}")]
    AlreadyExists(SeriesId),

    /// Optimistic concurrency failure: the write must be retried from a
    /// fresh read.
    #[error("Stale token for {series}: supplied {supplied}, current {current}")]
    StaleToken {
        series: SeriesId,
        supplied: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("Store lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Core(#[from] kalends_core::error::CoreError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
