//! Per-series exception set: change-exceptions and delete-exceptions.
//!
//! The set is an override log keyed by recurrence position, reconciled
//! against generator output at read time. Occurrences themselves stay
//! ephemeral; only the overrides persist.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use kalends_core::types::{ConfirmationStatus, ParticipantId, ShownAs};
use serde::{Deserialize, Serialize};

use crate::model::Occurrence;

/// Partial field override for one occurrence.
///
/// Every overridable field is optional: `Some` is the explicit
/// "field present" mask, unset fields inherit from the master at read time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceOverride {
    pub title: Option<String>,
    pub location: Option<String>,
    pub note: Option<String>,
    pub start_utc: Option<DateTime<Utc>>,
    pub end_utc: Option<DateTime<Utc>>,
    pub shown_as: Option<ShownAs>,
    /// Per-participant confirmation overrides for this occurrence only.
    pub confirmations: BTreeMap<ParticipantId, ConfirmationStatus>,
}

impl OccurrenceOverride {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.location.is_none()
            && self.note.is_none()
            && self.start_utc.is_none()
            && self.end_utc.is_none()
            && self.shown_as.is_none()
            && self.confirmations.is_empty()
    }

    /// Folds a later override into this one; later fields win.
    pub fn merge(&mut self, later: Self) {
        if later.title.is_some() {
            self.title = later.title;
        }
        if later.location.is_some() {
            self.location = later.location;
        }
        if later.note.is_some() {
            self.note = later.note;
        }
        if later.start_utc.is_some() {
            self.start_utc = later.start_utc;
        }
        if later.end_utc.is_some() {
            self.end_utc = later.end_utc;
        }
        if later.shown_as.is_some() {
            self.shown_as = later.shown_as;
        }
        self.confirmations.extend(later.confirmations);
    }

    /// Splices the overridden fields into a derived occurrence.
    pub fn apply(&self, occurrence: &mut Occurrence) {
        if let Some(title) = &self.title {
            occurrence.title = title.clone();
        }
        if let Some(location) = &self.location {
            occurrence.location = Some(location.clone());
        }
        if let Some(note) = &self.note {
            occurrence.note = Some(note.clone());
        }
        if let Some(start) = self.start_utc {
            occurrence.start_utc = start;
        }
        if let Some(end) = self.end_utc {
            occurrence.end_utc = end;
        }
        if let Some(shown_as) = self.shown_as {
            occurrence.shown_as = shown_as;
        }
        for (id, status) in &self.confirmations {
            if let Some(participant) = occurrence.participants.iter_mut().find(|p| p.id == *id) {
                participant.confirmation = *status;
            }
        }
    }
}

/// Change- and delete-exceptions of one series, keyed by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionSet {
    changes: BTreeMap<u32, OccurrenceOverride>,
    deletes: BTreeSet<u32>,
}

impl ExceptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.deletes.is_empty()
    }

    #[must_use]
    pub fn is_deleted(&self, position: u32) -> bool {
        self.deletes.contains(&position)
    }

    /// Marks an occurrence as removed from the expansion.
    ///
    /// Returns false if the position was already delete-excepted.
    pub fn delete(&mut self, position: u32) -> bool {
        // A deleted occurrence keeps no change override.
        if self.deletes.insert(position) {
            self.changes.remove(&position);
            true
        } else {
            false
        }
    }

    /// Records (or merges into) the change-exception at a position.
    pub fn record_change(&mut self, position: u32, fields: OccurrenceOverride) {
        self.changes.entry(position).or_default().merge(fields);
    }

    #[must_use]
    pub fn change_at(&self, position: u32) -> Option<&OccurrenceOverride> {
        self.changes.get(&position)
    }

    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.deletes.len()
    }

    /// Delete-excepted positions in ascending order.
    pub fn delete_positions(&self) -> impl Iterator<Item = u32> + '_ {
        self.deletes.iter().copied()
    }

    /// Number of delete-exceptions whose positions fall within `1..=max`.
    #[must_use]
    pub fn deletes_up_to(&self, max_position: u32) -> usize {
        self.deletes.range(..=max_position).count()
    }

    /// Drops every exception past `max_position`.
    ///
    /// Called atomically with a master update that shrinks the terminator,
    /// so no exception can reference a position the rule no longer reaches.
    pub fn retain_up_to(&mut self, max_position: u32) {
        self.changes.retain(|pos, _| *pos <= max_position);
        self.deletes.retain(|pos| *pos <= max_position);
    }

    /// Removes all exceptions (series converted to non-recurring or rule
    /// replaced wholesale).
    pub fn clear(&mut self) {
        self.changes.clear();
        self.deletes.clear();
    }

    /// ## Summary
    /// Applies this exception set to generator output: delete-excepted
    /// occurrences are dropped, change-excepted ones get their overridden
    /// fields spliced in.
    #[must_use]
    pub fn apply(&self, occurrences: Vec<Occurrence>) -> Vec<Occurrence> {
        occurrences
            .into_iter()
            .filter_map(|mut occ| {
                let Some(position) = occ.position else {
                    return Some(occ);
                };
                if self.is_deleted(position) {
                    return None;
                }
                if let Some(change) = self.change_at(position) {
                    change.apply(&mut occ);
                }
                Some(occ)
            })
            .collect()
    }
}
