use thiserror::Error;

use crate::conflict::Conflict;

/// Service layer errors - combines all lower-layer error types.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    CoreError(#[from] kalends_core::error::CoreError),

    #[error(transparent)]
    RecurError(#[from] kalends_recur::error::RecurError),

    #[error(transparent)]
    StoreError(#[from] kalends_store::error::StoreError),

    /// Hard scheduling conflicts blocking a write the caller did not mark
    /// as ignore-conflicts. Carries the full conflict list so the caller
    /// can present it or retry with the ignore flag.
    #[error("Scheduling conflict: {} blocking entries", .0.len())]
    SchedulingConflict(Vec<Conflict>),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    /// Returns the stable validation code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::CoreError(core) => core.code(),
            Self::StoreError(kalends_store::error::StoreError::Core(core)) => core.code(),
            Self::RecurError(kalends_recur::error::RecurError::Core(core)) => core.code(),
            _ => None,
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
