//! In-memory reference implementation of the series store.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, TimeDelta, Utc};
use kalends_core::types::{SeriesId, TimeRange};
use kalends_recur::rule::Terminator;

use crate::error::{StoreError, StoreResult};
use crate::store::{SeriesStore, StoredSeries};

/// Slack added to terminator horizons when filtering range snapshots, so
/// timezone offsets and trailing durations never exclude a real overlap.
const HORIZON_SLACK: TimeDelta = TimeDelta::days(2);

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<SeriesId, StoredSeries>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Strictly monotonic per-series token, even under clock regression or
    /// sub-microsecond write bursts.
    fn next_token(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let now = Utc::now();
        match previous {
            Some(prev) if now <= prev => prev + TimeDelta::microseconds(1),
            _ => now,
        }
    }

    /// Whether the record can possibly have occurrences in `range`.
    fn may_overlap(record: &StoredSeries, range: TimeRange) -> bool {
        if record.master.start_utc >= range.end {
            return false;
        }
        match &record.master.rule {
            None => record.master.end_utc > range.start || record.master.start_utc >= range.start,
            Some(rule) => match rule.terminator {
                Some(Terminator::Until(until)) => {
                    until + record.master.duration() + HORIZON_SLACK > range.start
                }
                // Count-terminated horizon depends on expansion; include it.
                _ => true,
            },
        }
    }
}

impl SeriesStore for MemoryStore {
    fn insert(&self, mut record: StoredSeries) -> StoreResult<DateTime<Utc>> {
        let mut map = self.inner.write().map_err(|_e| StoreError::Poisoned)?;
        let id = record.master.id;
        if map.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        let token = Self::next_token(None);
        record.last_modified = token;
        map.insert(id, record);
        tracing::debug!(series = %id, %token, "inserted series");
        Ok(token)
    }

    fn get(&self, id: SeriesId) -> StoreResult<StoredSeries> {
        let map = self.inner.read().map_err(|_e| StoreError::Poisoned)?;
        map.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn put(
        &self,
        id: SeriesId,
        expected: DateTime<Utc>,
        mut record: StoredSeries,
    ) -> StoreResult<DateTime<Utc>> {
        let mut map = self.inner.write().map_err(|_e| StoreError::Poisoned)?;
        let current = map.get(&id).ok_or(StoreError::NotFound(id))?;
        if current.last_modified != expected {
            tracing::warn!(
                series = %id,
                supplied = %expected,
                current = %current.last_modified,
                "rejected stale write"
            );
            return Err(StoreError::StaleToken {
                series: id,
                supplied: expected,
                current: current.last_modified,
            });
        }
        let token = Self::next_token(Some(current.last_modified));
        record.last_modified = token;
        map.insert(id, record);
        Ok(token)
    }

    fn delete(&self, id: SeriesId, expected: DateTime<Utc>) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_e| StoreError::Poisoned)?;
        let current = map.get(&id).ok_or(StoreError::NotFound(id))?;
        if current.last_modified != expected {
            return Err(StoreError::StaleToken {
                series: id,
                supplied: expected,
                current: current.last_modified,
            });
        }
        map.remove(&id);
        tracing::debug!(series = %id, "deleted series");
        Ok(())
    }

    fn snapshot_overlapping(&self, range: TimeRange) -> StoreResult<Vec<StoredSeries>> {
        // One read-lock acquisition: the snapshot is consistent across all
        // examined calendars.
        let map = self.inner.read().map_err(|_e| StoreError::Poisoned)?;
        let mut records: Vec<StoredSeries> = map
            .values()
            .filter(|record| Self::may_overlap(record, range))
            .cloned()
            .collect();
        records.sort_by_key(|record| record.master.id);
        Ok(records)
    }
}
