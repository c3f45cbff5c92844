use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an appointment series (one master record plus its rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesId(pub uuid::Uuid);

impl SeriesId {
    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a participant: an internal user, an external attendee,
/// or a bookable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub uuid::Uuid);

impl ParticipantId {
    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-participant confirmation state for one addressed instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    #[default]
    None,
    Accept,
    Decline,
    Tentative,
}

impl ConfirmationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Accept => "accept",
            Self::Decline => "decline",
            Self::Tentative => "tentative",
        }
    }
}

impl std::fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Busy-time classification of an appointment.
///
/// Only `Free` time never participates in conflict detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShownAs {
    #[default]
    Busy,
    Absent,
    Free,
}

impl ShownAs {
    /// Whether this classification blocks other appointments.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        !matches!(self, Self::Free)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Busy => "busy",
            Self::Absent => "absent",
            Self::Free => "free",
        }
    }
}

impl std::fmt::Display for ShownAs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of party a participant is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    Internal,
    External,
    Resource,
}

impl ParticipantKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::Resource => "resource",
        }
    }
}

impl std::fmt::Display for ParticipantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open UTC interval `[start, end)` used for range queries and
/// conflict windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// ## Errors
    /// Returns an invariant violation if `end < start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> crate::error::CoreResult<Self> {
        if end < start {
            return Err(crate::error::CoreError::InvariantViolation(
                "time range end precedes start",
            ));
        }
        Ok(Self { start, end })
    }

    /// Whether `[start, end)` intersects the given interval.
    #[must_use]
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_shown_as_busyness() {
        assert!(ShownAs::Busy.is_busy());
        assert!(ShownAs::Absent.is_busy());
        assert!(!ShownAs::Free.is_busy());
    }

    #[test]
    fn test_time_range_rejects_inverted() {
        let start = Utc.with_ymd_and_hms(2013, 10, 14, 8, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2013, 10, 14, 7, 0, 0).unwrap();
        assert!(TimeRange::new(start, end).is_err());
    }

    #[test]
    fn test_time_range_overlap_is_half_open() {
        let start = Utc.with_ymd_and_hms(2013, 10, 14, 8, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2013, 10, 14, 9, 0, 0).unwrap();
        let range = TimeRange::new(start, end).unwrap();

        // Touching at the boundary is not an overlap.
        assert!(!range.overlaps(end, end + chrono::TimeDelta::hours(1)));
        assert!(range.overlaps(start, end));
        assert!(range.overlaps(end - chrono::TimeDelta::minutes(1), end));
    }
}
