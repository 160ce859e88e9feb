//! Database error classification.
//!
//! Postgres reports constraint and concurrency failures through SQLSTATE
//! codes. Repositories classify them so that exclusion and uniqueness
//! violations surface as domain conflicts and serialization failures as
//! retryable errors.

use leavedesk_shared::AppError;
use sea_orm::{DbErr, RuntimeErr};

/// `serialization_failure`
pub const SERIALIZATION_FAILURE: &str = "40001";
/// `deadlock_detected`
pub const DEADLOCK_DETECTED: &str = "40P01";
/// `exclusion_violation`
pub const EXCLUSION_VIOLATION: &str = "23P01";
/// `unique_violation`
pub const UNIQUE_VIOLATION: &str = "23505";

/// Coarse class of a database failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbFailure {
    /// The transaction lost a serialization race and may be retried.
    SerializationFailure,
    /// A range exclusion constraint rejected the row.
    ExclusionViolation,
    /// A unique constraint rejected the row.
    UniqueViolation,
    /// Anything else.
    Other,
}

/// Returns the SQLSTATE code carried by `err`, if any.
#[must_use]
pub fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return None,
    };
    if let RuntimeErr::SqlxError(sqlx_err) = runtime {
        database_code(sqlx_err)
    } else {
        None
    }
}

fn database_code(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code.into_owned())
}

/// Maps a SQLSTATE code to a [`DbFailure`].
#[must_use]
pub fn classify_code(code: &str) -> DbFailure {
    match code {
        SERIALIZATION_FAILURE | DEADLOCK_DETECTED => DbFailure::SerializationFailure,
        EXCLUSION_VIOLATION => DbFailure::ExclusionViolation,
        UNIQUE_VIOLATION => DbFailure::UniqueViolation,
        _ => DbFailure::Other,
    }
}

/// Classifies a `SeaORM` error.
#[must_use]
pub fn classify(err: &DbErr) -> DbFailure {
    sqlstate(err).map_or(DbFailure::Other, |code| classify_code(&code))
}

/// Converts a raw database error into an [`AppError`].
#[must_use]
pub fn to_app_error(err: DbErr) -> AppError {
    if let DbErr::RecordNotFound(what) = &err {
        return AppError::NotFound(what.clone());
    }
    match classify(&err) {
        DbFailure::SerializationFailure => AppError::SerializationConflict(err.to_string()),
        DbFailure::ExclusionViolation | DbFailure::UniqueViolation => {
            AppError::Conflict(err.to_string())
        }
        DbFailure::Other => AppError::Database(err.to_string()),
    }
}
