//! Appointment series aggregate: insert, update, delete, confirm.
//!
//! Every mutation validates, conflict-checks, then persists through the
//! store's compare-and-swap token. Callers see either a new token or a
//! typed error; partially applied writes cannot happen.

use chrono::{DateTime, TimeDelta, Utc};
use kalends_core::config::RecurrenceConfig;
use kalends_core::constants::{
    CONFLICT_WINDOW_DAYS, ERR_CONFIRM_FOREIGN, ERR_END_BEFORE_START, ERR_RULE_INVALID,
};
use kalends_core::error::CoreError;
use kalends_core::types::{ConfirmationStatus, ParticipantId, SeriesId, ShownAs, TimeRange};
use kalends_recur::exception::OccurrenceOverride;
use kalends_recur::generator;
use kalends_recur::model::{self, Occurrence, Participant, SeriesMaster};
use kalends_recur::rule::RecurrenceRule;
use kalends_store::store::{SeriesStore, StoredSeries};

use crate::conflict::{self, Conflict};
use crate::error::{ServiceError, ServiceResult};

/// What a mutation addresses: the whole series, or one occurrence by its
/// 1-based recurrence position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Series(SeriesId),
    Occurrence(SeriesId, u32),
}

impl Target {
    #[must_use]
    pub const fn series_id(self) -> SeriesId {
        match self {
            Self::Series(id) | Self::Occurrence(id, _) => id,
        }
    }
}

/// Recurrence rule part of a series patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RulePatch {
    /// Leave the rule as it is.
    #[default]
    Keep,
    /// Convert the series to a non-recurring appointment.
    Clear,
    /// Replace the rule wholesale.
    Set(RecurrenceRule),
}

impl RulePatch {
    #[must_use]
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Field-present overlay for an update: only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesPatch {
    pub title: Option<String>,
    pub location: Option<String>,
    pub note: Option<String>,
    pub start_utc: Option<DateTime<Utc>>,
    pub end_utc: Option<DateTime<Utc>>,
    pub shown_as: Option<ShownAs>,
    pub rule: RulePatch,
    pub participants: Option<Vec<Participant>>,
}

/// Result of a successful mutation: the fresh token plus any soft
/// conflicts (and, with the ignore flag, overridden hard ones).
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub series_id: SeriesId,
    pub token: DateTime<Utc>,
    pub conflicts: Vec<Conflict>,
}

/// Orchestrates all series mutations over a [`SeriesStore`].
#[derive(Debug)]
pub struct AppointmentService<S: SeriesStore> {
    store: S,
    recurrence: RecurrenceConfig,
}

impl<S: SeriesStore> AppointmentService<S> {
    #[must_use]
    pub const fn new(store: S, recurrence: RecurrenceConfig) -> Self {
        Self { store, recurrence }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// ## Summary
    /// Validates and persists a new series.
    ///
    /// The series is conflict-checked over a bounded window from its start.
    /// Hard conflicts reject the insert unless `ignore_conflicts` is set;
    /// soft conflicts are reported in the outcome either way.
    ///
    /// ## Errors
    /// Returns a validation error, a [`ServiceError::SchedulingConflict`],
    /// or a store error.
    #[tracing::instrument(skip_all, fields(series = %master.id))]
    pub fn insert(
        &self,
        master: SeriesMaster,
        ignore_conflicts: bool,
    ) -> ServiceResult<MutationOutcome> {
        master.validate()?;
        let window = conflict_window(master.start_utc);
        let candidates = generator::expand(&master, window, &self.recurrence)?;
        let conflicts = self.check(&candidates, master.id, window, ignore_conflicts)?;

        let series_id = master.id;
        let token = self.store.insert(StoredSeries::new(master))?;
        tracing::debug!(%token, conflicts = conflicts.len(), "inserted series");
        Ok(MutationOutcome {
            series_id,
            token,
            conflicts,
        })
    }

    /// ## Summary
    /// Applies a patch to a series or a single occurrence.
    ///
    /// Series scope rewrites the master; replacing the rule drops
    /// exceptions past the new expansion length, clearing it drops all of
    /// them. Occurrence scope materializes the patch as a change-exception
    /// and leaves every sibling untouched.
    ///
    /// ## Errors
    /// Returns a validation error, [`ServiceError::NotFound`] for a missing
    /// or deleted occurrence, a scheduling conflict, or a stale token.
    #[tracing::instrument(skip_all, fields(series = %target.series_id()))]
    pub fn update(
        &self,
        target: Target,
        patch: SeriesPatch,
        token: DateTime<Utc>,
        ignore_conflicts: bool,
    ) -> ServiceResult<MutationOutcome> {
        match target {
            Target::Series(id) => self.update_series(id, patch, token, ignore_conflicts),
            Target::Occurrence(id, position) => {
                self.update_occurrence(id, position, patch, token, ignore_conflicts)
            }
        }
    }

    fn update_series(
        &self,
        id: SeriesId,
        patch: SeriesPatch,
        token: DateTime<Utc>,
        ignore_conflicts: bool,
    ) -> ServiceResult<MutationOutcome> {
        let mut record = self.store.get(id)?;
        apply_patch(&mut record.master, &patch);
        match patch.rule {
            RulePatch::Keep => {}
            RulePatch::Clear => {
                record.master.rule = None;
                record.exceptions.clear();
            }
            RulePatch::Set(rule) => {
                rule.validate()?;
                record.master.rule = Some(rule);
                // The new rule may reach fewer positions than the old one.
                let total = generator::total_positions(&record.master, &self.recurrence)?;
                record.exceptions.retain_up_to(total);
            }
        }
        record.master.validate()?;

        let window = conflict_window(record.master.start_utc);
        let candidates = record
            .exceptions
            .apply(generator::expand(&record.master, window, &self.recurrence)?);
        let conflicts = self.check(&candidates, id, window, ignore_conflicts)?;

        let token = self.store.put(id, token, record)?;
        tracing::debug!(%token, "updated series");
        Ok(MutationOutcome {
            series_id: id,
            token,
            conflicts,
        })
    }

    fn update_occurrence(
        &self,
        id: SeriesId,
        position: u32,
        patch: SeriesPatch,
        token: DateTime<Utc>,
        ignore_conflicts: bool,
    ) -> ServiceResult<MutationOutcome> {
        if !patch.rule.is_keep() {
            return Err(CoreError::validation(
                ERR_RULE_INVALID,
                "recurrence rules apply to the whole series, not one occurrence",
            )
            .into());
        }
        if patch.participants.is_some() {
            return Err(CoreError::validation(
                ERR_RULE_INVALID,
                "the participant list applies to the whole series, not one occurrence",
            )
            .into());
        }

        let mut record = self.store.get(id)?;
        let mut occurrence = self.existing_occurrence(&record, position)?;

        let fields = OccurrenceOverride {
            title: patch.title,
            location: patch.location,
            note: patch.note,
            start_utc: patch.start_utc,
            end_utc: patch.end_utc,
            shown_as: patch.shown_as,
            confirmations: std::collections::BTreeMap::new(),
        };
        fields.apply(&mut occurrence);
        model::validate_title(&occurrence.title)?;
        if occurrence.end_utc < occurrence.start_utc {
            return Err(CoreError::validation(
                ERR_END_BEFORE_START,
                "occurrence end precedes start",
            )
            .into());
        }

        // Only the rescheduled occurrence needs conflict-checking.
        let window = span_around(&occurrence);
        let conflicts = self.check(
            std::slice::from_ref(&occurrence),
            id,
            window,
            ignore_conflicts,
        )?;

        record.exceptions.record_change(position, fields);
        let token = self.store.put(id, token, record)?;
        tracing::debug!(position, %token, "recorded change-exception");
        Ok(MutationOutcome {
            series_id: id,
            token,
            conflicts,
        })
    }

    /// ## Summary
    /// Deletes a series, or delete-excepts one occurrence.
    ///
    /// Returns `None` when the whole series is gone, `Some` with the fresh
    /// token when only an occurrence was removed.
    ///
    /// ## Errors
    /// Returns [`ServiceError::NotFound`] for a missing series, an
    /// out-of-range position, or a position already delete-excepted, and a
    /// stale-token error on a token mismatch.
    #[tracing::instrument(skip_all, fields(series = %target.series_id()))]
    pub fn delete(
        &self,
        target: Target,
        token: DateTime<Utc>,
    ) -> ServiceResult<Option<MutationOutcome>> {
        match target {
            Target::Series(id) => {
                self.store.delete(id, token)?;
                tracing::debug!("deleted series");
                Ok(None)
            }
            Target::Occurrence(id, position) => {
                let mut record = self.store.get(id)?;
                self.existing_occurrence(&record, position)?;
                if !record.exceptions.delete(position) {
                    return Err(ServiceError::NotFound(format!(
                        "occurrence {position} of series {id} is already deleted"
                    )));
                }
                let token = self.store.put(id, token, record)?;
                tracing::debug!(position, %token, "recorded delete-exception");
                Ok(Some(MutationOutcome {
                    series_id: id,
                    token,
                    conflicts: Vec::new(),
                }))
            }
        }
    }

    /// ## Summary
    /// Records a participant's confirmation for the series or for one
    /// occurrence.
    ///
    /// Occurrence-scoped confirmations are stored as change-exceptions, so
    /// they never leak onto sibling occurrences.
    ///
    /// ## Errors
    /// Returns a validation error with a stable code when `participant` is
    /// not on the appointment, [`ServiceError::NotFound`] for a missing or
    /// deleted occurrence, and a stale-token error on a token mismatch.
    #[tracing::instrument(skip_all, fields(series = %id, participant = %participant))]
    pub fn confirm(
        &self,
        id: SeriesId,
        position: Option<u32>,
        participant: ParticipantId,
        status: ConfirmationStatus,
        token: DateTime<Utc>,
    ) -> ServiceResult<MutationOutcome> {
        let mut record = self.store.get(id)?;
        if record.master.participant(participant).is_none() {
            return Err(CoreError::validation(
                ERR_CONFIRM_FOREIGN,
                format!("user {participant} is not a participant of this appointment"),
            )
            .into());
        }

        match position {
            None => {
                if let Some(entry) = record.master.participant_mut(participant) {
                    entry.confirmation = status;
                }
            }
            Some(position) => {
                self.existing_occurrence(&record, position)?;
                let mut confirmations = std::collections::BTreeMap::new();
                confirmations.insert(participant, status);
                record.exceptions.record_change(
                    position,
                    OccurrenceOverride {
                        confirmations,
                        ..OccurrenceOverride::default()
                    },
                );
            }
        }

        let token = self.store.put(id, token, record)?;
        tracing::debug!(?status, %token, "recorded confirmation");
        Ok(MutationOutcome {
            series_id: id,
            token,
            conflicts: Vec::new(),
        })
    }

    /// ## Summary
    /// Removes a participant from the series.
    ///
    /// The series survives even without internal participants; ownership
    /// and cleanup of orphaned appointments belong to the folder layer.
    ///
    /// ## Errors
    /// Returns [`ServiceError::NotFound`] when the participant is not on
    /// the series, and a stale-token error on a token mismatch.
    #[tracing::instrument(skip_all, fields(series = %id, participant = %participant))]
    pub fn remove_participant(
        &self,
        id: SeriesId,
        participant: ParticipantId,
        token: DateTime<Utc>,
    ) -> ServiceResult<MutationOutcome> {
        let mut record = self.store.get(id)?;
        if record.master.participant(participant).is_none() {
            return Err(ServiceError::NotFound(format!(
                "participant {participant} is not on series {id}"
            )));
        }
        record.master.participants.retain(|p| p.id != participant);
        if !record.master.has_internal_participants() {
            tracing::warn!("series has no internal participants left");
        }

        let token = self.store.put(id, token, record)?;
        Ok(MutationOutcome {
            series_id: id,
            token,
            conflicts: Vec::new(),
        })
    }

    /// The occurrence at `position`, with its change-exception applied.
    /// Missing and delete-excepted positions are both not-found.
    fn existing_occurrence(
        &self,
        record: &StoredSeries,
        position: u32,
    ) -> ServiceResult<Occurrence> {
        let id = record.master.id;
        if record.exceptions.is_deleted(position) {
            return Err(ServiceError::NotFound(format!(
                "occurrence {position} of series {id} is deleted"
            )));
        }
        let mut occurrence = generator::occurrence_at(&record.master, position, &self.recurrence)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "series {id} has no occurrence at position {position}"
                ))
            })?;
        if let Some(change) = record.exceptions.change_at(position) {
            change.apply(&mut occurrence);
        }
        Ok(occurrence)
    }

    /// Runs conflict detection and applies the hard-conflict gate.
    fn check(
        &self,
        candidates: &[Occurrence],
        exclude: SeriesId,
        window: TimeRange,
        ignore_conflicts: bool,
    ) -> ServiceResult<Vec<Conflict>> {
        let snapshot = self.store.snapshot_overlapping(window)?;
        let conflicts = conflict::find_conflicts(
            candidates,
            Some(exclude),
            &snapshot,
            window,
            &self.recurrence,
        )?;
        if !ignore_conflicts && conflicts.iter().any(Conflict::is_hard) {
            return Err(ServiceError::SchedulingConflict(conflicts));
        }
        Ok(conflicts)
    }
}

/// Conflict-check window for an insert or series-scoped update.
fn conflict_window(start: DateTime<Utc>) -> TimeRange {
    TimeRange {
        start,
        end: start + TimeDelta::days(CONFLICT_WINDOW_DAYS),
    }
}

/// Window around one occurrence, padded a day each way so full-day
/// comparisons across timezone offsets stay inside it.
fn span_around(occurrence: &Occurrence) -> TimeRange {
    TimeRange {
        start: occurrence.start_utc - TimeDelta::days(1),
        end: occurrence.end_utc + TimeDelta::days(1),
    }
}

fn apply_patch(master: &mut SeriesMaster, patch: &SeriesPatch) {
    if let Some(title) = &patch.title {
        master.title = title.clone();
    }
    if let Some(location) = &patch.location {
        master.location = Some(location.clone());
    }
    if let Some(note) = &patch.note {
        master.note = Some(note.clone());
    }
    if let Some(start) = patch.start_utc {
        master.start_utc = start;
    }
    if let Some(end) = patch.end_utc {
        master.end_utc = end;
    }
    if let Some(shown_as) = patch.shown_as {
        master.shown_as = shown_as;
    }
    if let Some(participants) = &patch.participants {
        master.participants = participants.clone();
    }
}
