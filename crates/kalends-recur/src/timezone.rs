//! Wall-clock to instant resolution in the series' declared timezone.
//!
//! Recurrence stepping happens on wall-clock values so the local start hour
//! stays stable across DST transitions; this module turns each candidate
//! back into a UTC instant, resolving gap and fold cases deterministically.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use kalends_core::config::DstGapPolicy;

use crate::error::{RecurError, RecurResult};

/// Step used to probe out of a DST gap. Gaps are almost always a whole
/// hour; a few zones (Lord Howe) shift by 30 minutes.
const GAP_PROBE_STEP: TimeDelta = TimeDelta::minutes(15);

/// Longest gap probed before giving up (no real zone skips more).
const GAP_PROBE_LIMIT: i32 = 16;

/// ## Summary
/// Resolves a wall-clock datetime in `zone` to a UTC instant.
///
/// Ambiguous times (fall-back fold) resolve to the earlier instant, the
/// pre-transition reading. Nonexistent times (spring-forward gap) follow
/// the configured [`DstGapPolicy`].
///
/// ## Errors
/// Returns [`RecurError::NonexistentTime`] when the time falls in a gap and
/// the policy is [`DstGapPolicy::Reject`], or when probing out of the gap
/// fails to find a valid instant.
pub fn resolve_wall_clock(
    local: NaiveDateTime,
    zone: Tz,
    policy: DstGapPolicy,
) -> RecurResult<DateTime<Utc>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // Fold: the hour occurs twice; take the first occurrence.
        LocalResult::Ambiguous(first, _second) => Ok(first.with_timezone(&Utc)),
        LocalResult::None => resolve_gap(local, zone, policy),
    }
}

fn resolve_gap(
    local: NaiveDateTime,
    zone: Tz,
    policy: DstGapPolicy,
) -> RecurResult<DateTime<Utc>> {
    let step = match policy {
        DstGapPolicy::ShiftForward => GAP_PROBE_STEP,
        DstGapPolicy::ShiftBackward => -GAP_PROBE_STEP,
        DstGapPolicy::Reject => {
            return Err(RecurError::NonexistentTime { local, zone });
        }
    };

    tracing::trace!(%local, %zone, ?policy, "resolving DST gap");

    let mut probe = local;
    for _attempt in 0..GAP_PROBE_LIMIT {
        probe += step;
        match zone.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(first, _second) => return Ok(first.with_timezone(&Utc)),
            LocalResult::None => {}
        }
    }

    Err(RecurError::NonexistentTime { local, zone })
}
