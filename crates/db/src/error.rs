//! Translation of `sqlx` failures into domain errors.

use marquee_core::error::CoreError;
use marquee_core::validation::ValidationErrors;

/// PostgreSQL `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// PostgreSQL `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// PostgreSQL `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

/// Classify a sqlx error.
///
/// - Foreign key violations mean a write referenced an unknown genre,
///   cinema or actor, reported as a validation error on `relations`.
/// - Unique violations map to [`CoreError::Conflict`].
/// - Serialization failures, deadlocks, pool timeouts and I/O errors are
///   transient storage errors.
/// - Everything else is a permanent storage error.
pub fn db_error(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => CoreError::Validation(ValidationErrors::single(
                "relations",
                "References an unknown genre, cinema or actor",
            )),
            Some(UNIQUE_VIOLATION) => CoreError::Conflict(format!(
                "Duplicate value violates unique constraint: {}",
                db_err.constraint().unwrap_or("unknown")
            )),
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                CoreError::transient(db_err.to_string())
            }
            _ => CoreError::storage(db_err.to_string()),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => CoreError::transient(err.to_string()),
        _ => CoreError::storage(err.to_string()),
    }
}

/// Classify the failure of an insert.
///
/// Like [`db_error`], except that an I/O failure is permanent: the insert may
/// have been committed before the connection dropped, and running it again
/// would create a second row.
pub fn db_insert_error(err: sqlx::Error) -> CoreError {
    match err {
        sqlx::Error::Io(_) => CoreError::storage(err.to_string()),
        other => db_error(other),
    }
}
