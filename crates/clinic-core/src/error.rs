//! Error taxonomy shared across all clinic subsystems.

use thiserror::Error;

use crate::time::TimeParseError;

/// Errors surfaced by clinic operations.
///
/// Write-path failures (missing fields, conflicts, lookups) block the
/// operation and reach the caller. Read-path parsing problems on individual
/// records never appear here; those records are skipped and logged so one
/// corrupt entry cannot take down a whole view.
#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("duplicate ID: {0}")]
    DuplicateId(String),

    #[error("scheduling conflict: {0}")]
    Conflict(String),

    #[error("patient {0} already has an active visit")]
    AlreadyActive(String),

    #[error("no active visit for patient {0}")]
    NoActiveVisit(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A timestamp the caller supplied (as opposed to one already on disk)
/// must parse; surface it as a validation failure.
impl From<TimeParseError> for ClinicError {
    fn from(e: TimeParseError) -> Self {
        ClinicError::Validation(e.to_string())
    }
}

pub type ClinicResult<T> = Result<T, ClinicError>;
