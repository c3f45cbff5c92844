use thiserror::Error;

/// Core error type with minimal dependencies.
///
/// Scheduling conflicts are deliberately absent here: they are structured
/// results returned alongside (or instead of) a successful write, not errors.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed input, rejected before anything is persisted.
    /// Carries a stable opaque error code from [`crate::constants`].
    #[error("Validation error [{code}]: {message}")]
    Validation {
        code: &'static str,
        message: String,
    },

    /// Optimistic concurrency failure: the caller's token predates the
    /// stored one. The caller must reload and retry.
    #[error("Stale token: supplied {supplied}, current {current}")]
    StaleToken {
        supplied: chrono::DateTime<chrono::Utc>,
        current: chrono::DateTime<chrono::Utc>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

impl CoreError {
    /// Builds a validation error with a stable code.
    #[must_use]
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    /// Returns the stable error code, if this error carries one.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Validation { code, .. } => Some(code),
            _ => None,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
