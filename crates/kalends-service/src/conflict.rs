//! Scheduling conflict detection.
//!
//! A conflict needs three things: a time overlap, busy time on both sides
//! (`shown_as != free`), and a shared participant. Resource participants
//! make the conflict hard (blocking); user participants make it soft
//! (informational). Detection is a pure function of its inputs; the
//! per-operation ignore flag lives with the caller, never here.

use chrono::{DateTime, Utc};
use kalends_core::config::RecurrenceConfig;
use kalends_core::types::{ParticipantId, SeriesId, TimeRange};
use kalends_recur::generator;
use kalends_recur::model::Occurrence;
use kalends_store::store::StoredSeries;
use serde::Serialize;

use crate::error::ServiceResult;

/// Whether a conflict blocks the write or merely accompanies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    /// Blocks the write unless the operation set the ignore flag.
    Hard,
    /// Reported alongside a successful write.
    Soft,
}

/// One conflicting overlap, one entry per overlapping shared participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub severity: ConflictSeverity,
    pub participant: ParticipantId,
    pub other_series: SeriesId,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

impl Conflict {
    #[must_use]
    pub const fn is_hard(&self) -> bool {
        matches!(self.severity, ConflictSeverity::Hard)
    }
}

/// ## Summary
/// Whether two occurrences overlap in time.
///
/// Timed appointments compare half-open instant intervals. When either
/// side is full-time, both sides compare by calendar day, each in its own
/// declared timezone, so a full-day appointment conflicts with any busy
/// time on the same local day regardless of offset.
#[must_use]
pub fn overlaps(a: &Occurrence, b: &Occurrence) -> bool {
    if a.full_time || b.full_time {
        let (a_first, a_last) = a.day_span();
        let (b_first, b_last) = b.day_span();
        a_first < b_last && b_first < a_last
    } else {
        a.start_utc < b.end_utc && b.start_utc < a.end_utc
    }
}

/// ## Summary
/// Finds conflicts between candidate occurrences and every other series in
/// the snapshot.
///
/// Recurring series in the snapshot are expanded only over `window`, never
/// wholesale; `exclude` skips the series being written so it cannot
/// conflict with itself.
///
/// ## Errors
/// Returns an error if expanding a snapshot series fails.
pub fn find_conflicts(
    candidates: &[Occurrence],
    exclude: Option<SeriesId>,
    snapshot: &[StoredSeries],
    window: TimeRange,
    cfg: &RecurrenceConfig,
) -> ServiceResult<Vec<Conflict>> {
    let mut conflicts = Vec::new();

    for record in snapshot {
        if exclude == Some(record.master.id) {
            continue;
        }
        let others = record
            .exceptions
            .apply(generator::expand(&record.master, window, cfg)?);

        for other in &others {
            if !other.shown_as.is_busy() {
                continue;
            }
            for candidate in candidates {
                if !candidate.shown_as.is_busy() || !overlaps(candidate, other) {
                    continue;
                }
                for participant in &candidate.participants {
                    if other.participant(participant.id).is_none() {
                        continue;
                    }
                    let severity = if participant.kind
                        == kalends_core::types::ParticipantKind::Resource
                    {
                        ConflictSeverity::Hard
                    } else {
                        ConflictSeverity::Soft
                    };
                    conflicts.push(Conflict {
                        severity,
                        participant: participant.id,
                        other_series: record.master.id,
                        start_utc: other.start_utc,
                        end_utc: other.end_utc,
                    });
                }
            }
        }
    }

    tracing::trace!(
        candidates = candidates.len(),
        examined = snapshot.len(),
        found = conflicts.len(),
        "conflict scan complete"
    );
    Ok(conflicts)
}
