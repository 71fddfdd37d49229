use thiserror::Error;

/// Coarse failure category, so callers can branch without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Operation attempted in a state that forbids it.
    State,
    /// Backend constraint violation.
    Integrity,
    /// Backend unreachable, busy or the connection dropped.
    Connectivity,
    /// Any other backend-reported failure.
    Backend,
    /// Caller-supplied identifier or value has no matching entry.
    Value,
    /// Invalid construction options.
    Config,
}

#[derive(Debug, Error)]
pub enum SqlMyError {
    #[error("State error: {0}")]
    StateError(String),

    #[error("Integrity error: {0}")]
    IntegrityError(#[source] rusqlite::Error),

    #[error("Connectivity error: {0}")]
    ConnectivityError(#[source] rusqlite::Error),

    #[error("Backend error: {0}")]
    BackendError(#[source] rusqlite::Error),

    #[error("Value error: {0}")]
    ValueError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SqlMyError {
    /// Sort a driver error into the integrity / connectivity / generic buckets.
    #[must_use]
    pub fn from_backend(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        let code = match &err {
            rusqlite::Error::SqliteFailure(ffi_err, _) => Some(ffi_err.code),
            _ => None,
        };
        match code {
            Some(ErrorCode::ConstraintViolation) => SqlMyError::IntegrityError(err),
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::DiskFull
                | ErrorCode::PermissionDenied,
            ) => SqlMyError::ConnectivityError(err),
            _ => SqlMyError::BackendError(err),
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            SqlMyError::StateError(_) => ErrorCategory::State,
            SqlMyError::IntegrityError(_) => ErrorCategory::Integrity,
            SqlMyError::ConnectivityError(_) => ErrorCategory::Connectivity,
            SqlMyError::BackendError(_) => ErrorCategory::Backend,
            SqlMyError::ValueError(_) => ErrorCategory::Value,
            SqlMyError::ConfigError(_) => ErrorCategory::Config,
        }
    }

    /// True for the three categories reported by the backend itself.
    #[must_use]
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Integrity | ErrorCategory::Connectivity | ErrorCategory::Backend
        )
    }

    pub(crate) fn not_initialized() -> Self {
        SqlMyError::StateError("connection is not initialized".into())
    }

    pub(crate) fn not_started() -> Self {
        SqlMyError::StateError("transaction is not started".into())
    }
}

impl From<rusqlite::Error> for SqlMyError {
    fn from(err: rusqlite::Error) -> Self {
        SqlMyError::from_backend(err)
    }
}
