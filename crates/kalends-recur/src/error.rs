use chrono::NaiveDateTime;
use thiserror::Error;

/// Recurrence engine errors.
#[derive(Error, Debug)]
pub enum RecurError {
    #[error(transparent)]
    Core(#[from] kalends_core::error::CoreError),

    /// The wall-clock start falls in a DST spring-forward gap and the
    /// configured policy is to reject rather than shift.
    #[error("Nonexistent local time {local} in {zone} (DST gap)")]
    NonexistentTime {
        local: NaiveDateTime,
        zone: chrono_tz::Tz,
    },

    /// Expansion would emit more occurrences than the configured cap.
    #[error("Expansion exceeded the occurrence cap of {0}")]
    LimitExceeded(u32),
}

pub type RecurResult<T> = std::result::Result<T, RecurError>;
