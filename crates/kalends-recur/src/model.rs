//! Appointment series master and derived occurrence records.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use kalends_core::constants::{
    ERR_END_BEFORE_START, ERR_TITLE_INVALID, ERR_TITLE_MISSING, MAX_TITLE_LENGTH,
};
use kalends_core::error::{CoreError, CoreResult};
use kalends_core::types::{ConfirmationStatus, ParticipantId, ParticipantKind, SeriesId, ShownAs};
use serde::{Deserialize, Serialize};

use crate::rule::RecurrenceRule;

/// One party on an appointment with its series-level confirmation state.
///
/// Per-occurrence confirmation overrides live on change-exceptions, never
/// here, so confirming one occurrence cannot disturb its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub kind: ParticipantKind,
    pub confirmation: ConfirmationStatus,
}

impl Participant {
    #[must_use]
    pub const fn new(id: ParticipantId, kind: ParticipantKind) -> Self {
        Self {
            id,
            kind,
            confirmation: ConfirmationStatus::None,
        }
    }

    #[must_use]
    pub const fn internal(id: ParticipantId) -> Self {
        Self::new(id, ParticipantKind::Internal)
    }

    #[must_use]
    pub const fn external(id: ParticipantId) -> Self {
        Self::new(id, ParticipantKind::External)
    }

    #[must_use]
    pub const fn resource(id: ParticipantId) -> Self {
        Self::new(id, ParticipantKind::Resource)
    }
}

/// ## Summary
/// Validates a title wherever one can be written: on the master and on
/// occurrence-scoped change-exceptions alike.
///
/// ## Errors
/// Returns a validation error with a stable code for a missing or
/// malformed title.
pub fn validate_title(title: &str) -> CoreResult<()> {
    if title.trim().is_empty() {
        return Err(CoreError::validation(ERR_TITLE_MISSING, "title is required"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::validation(
            ERR_TITLE_INVALID,
            format!("title exceeds {MAX_TITLE_LENGTH} characters"),
        ));
    }
    if title.chars().any(char::is_control) {
        return Err(CoreError::validation(
            ERR_TITLE_INVALID,
            "title contains control characters",
        ));
    }
    Ok(())
}

/// Master record of an appointment series.
///
/// Owns its recurrence rule; the duration `end_utc - start_utc` is carried
/// to every derived occurrence. `timezone` is the zone wall-clock math is
/// performed in (recurrence stepping, UNTIL comparison, full-day spans).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMaster {
    pub id: SeriesId,
    pub title: String,
    pub location: Option<String>,
    pub note: Option<String>,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub timezone: Tz,
    pub full_time: bool,
    pub shown_as: ShownAs,
    pub rule: Option<RecurrenceRule>,
    pub participants: Vec<Participant>,
}

impl SeriesMaster {
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end_utc - self.start_utc
    }

    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        self.rule.is_some()
    }

    #[must_use]
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    #[must_use]
    pub fn has_internal_participants(&self) -> bool {
        self.participants
            .iter()
            .any(|p| p.kind == ParticipantKind::Internal)
    }

    /// ## Summary
    /// Structural validation run before any mutation persists.
    ///
    /// ## Errors
    /// Returns a validation error with a stable code for a missing or
    /// malformed title, an end preceding the start, or an invalid rule.
    pub fn validate(&self) -> CoreResult<()> {
        validate_title(&self.title)?;
        if self.end_utc < self.start_utc {
            return Err(CoreError::validation(
                ERR_END_BEFORE_START,
                "appointment end precedes start",
            ));
        }
        if let Some(rule) = &self.rule {
            rule.validate()?;
        }
        Ok(())
    }
}

/// One concrete instance of a series, derived at read time.
///
/// Never persisted independently; field overrides are materialized as
/// change-exceptions and merged in by the exception set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub series_id: SeriesId,
    /// 1-based ordinal within the series expansion; `None` for
    /// non-recurring appointments.
    pub position: Option<u32>,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub title: String,
    pub location: Option<String>,
    pub note: Option<String>,
    pub timezone: Tz,
    pub full_time: bool,
    pub shown_as: ShownAs,
    pub participants: Vec<Participant>,
}

impl Occurrence {
    /// Projection of a non-recurring master (no recurrence position).
    #[must_use]
    pub fn single(master: &SeriesMaster) -> Self {
        Self::derived(master, None, master.start_utc, master.end_utc)
    }

    /// Projection of one generated instance, fields inherited from the master.
    #[must_use]
    pub fn derived(
        master: &SeriesMaster,
        position: Option<u32>,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            series_id: master.id,
            position,
            start_utc,
            end_utc,
            title: master.title.clone(),
            location: master.location.clone(),
            note: master.note.clone(),
            timezone: master.timezone,
            full_time: master.full_time,
            shown_as: master.shown_as,
            participants: master.participants.clone(),
        }
    }

    #[must_use]
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Calendar days this occurrence covers in its own timezone, as
    /// `[first, last_exclusive)`.
    ///
    /// Full-day scheduling compares these spans instead of instants.
    #[must_use]
    pub fn day_span(&self) -> (NaiveDate, NaiveDate) {
        let start_local = self.start_utc.with_timezone(&self.timezone).naive_local();
        let end_local = self.end_utc.with_timezone(&self.timezone).naive_local();

        let first = start_local.date();
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default();
        let last_exclusive = if end_local.time() == midnight && end_local.date() > first {
            end_local.date()
        } else {
            end_local
                .date()
                .succ_opt()
                .unwrap_or_else(|| end_local.date())
        };
        (first, last_exclusive)
    }
}
