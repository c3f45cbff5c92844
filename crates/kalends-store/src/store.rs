//! Store trait and the stored-series record.

use chrono::{DateTime, Utc};
use kalends_core::types::{SeriesId, TimeRange};
use kalends_recur::exception::ExceptionSet;
use kalends_recur::model::SeriesMaster;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// What the store persists per series: the master, its exception set, and
/// the optimistic concurrency token. Occurrences are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSeries {
    pub master: SeriesMaster,
    pub exceptions: ExceptionSet,
    /// Last-modified token; set by the store on every successful write.
    pub last_modified: DateTime<Utc>,
}

impl StoredSeries {
    /// A fresh record for insertion; the store assigns the real token.
    #[must_use]
    pub fn new(master: SeriesMaster) -> Self {
        Self {
            master,
            exceptions: ExceptionSet::new(),
            last_modified: DateTime::<Utc>::MIN_UTC,
        }
    }
}

/// Keyed series storage with compare-and-swap semantics.
///
/// `put` and `delete` take the token the caller read; a token older than
/// the stored one fails the write and persists nothing.
pub trait SeriesStore: Send + Sync {
    /// ## Summary
    /// Persists a new series and returns its initial token.
    ///
    /// ## Errors
    /// Fails if a series with the same id already exists.
    fn insert(&self, record: StoredSeries) -> StoreResult<DateTime<Utc>>;

    /// ## Summary
    /// Reads one series record.
    ///
    /// ## Errors
    /// Fails if the series does not exist.
    fn get(&self, id: SeriesId) -> StoreResult<StoredSeries>;

    /// ## Summary
    /// Replaces a series record if `expected` matches the stored token,
    /// returning the new token.
    ///
    /// ## Errors
    /// Fails with a stale-token error on a token mismatch; nothing is
    /// persisted in that case.
    fn put(
        &self,
        id: SeriesId,
        expected: DateTime<Utc>,
        record: StoredSeries,
    ) -> StoreResult<DateTime<Utc>>;

    /// ## Summary
    /// Removes a series (master, rule and all exceptions) if `expected`
    /// matches the stored token.
    ///
    /// ## Errors
    /// Fails on unknown series or stale token.
    fn delete(&self, id: SeriesId, expected: DateTime<Utc>) -> StoreResult<()>;

    /// ## Summary
    /// Consistent point-in-time snapshot of every series that may have
    /// occurrences intersecting `range`.
    ///
    /// Over-approximation is fine (callers re-expand per window); missing
    /// a series that does intersect is not.
    ///
    /// ## Errors
    /// Fails only on store-level faults.
    fn snapshot_overlapping(&self, range: TimeRange) -> StoreResult<Vec<StoredSeries>>;
}
