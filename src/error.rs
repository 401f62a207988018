// ⚠️ Error types shared by the store, the services and the CLI

use thiserror::Error;

/// Library errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness constraint was violated.
    #[error("{0}")]
    Conflict(String),

    /// The request payload failed validation.
    #[error("{0}")]
    Validation(String),

    /// A referenced record (factor, source, aspect...) does not exist.
    #[error("{0}")]
    InvalidReference(String),

    /// SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV import failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A call to another service failed.
    #[cfg(feature = "server")]
    #[error("Upstream service error: {0}")]
    Service(#[from] crate::http_client::ServiceError),

    /// Report template failed to render.
    #[cfg(feature = "server")]
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The shared database connection was poisoned by a panicking handler.
    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

/// Result type using the library Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Extended SQLite result codes we classify.
const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

/// Classify a constraint failure from an INSERT.
///
/// UNIQUE / PRIMARY KEY violations become `Conflict(conflict_msg)`, foreign key
/// violations become `InvalidReference(reference_msg)`. Anything else is passed
/// through as a database error.
pub(crate) fn classify_constraint(
    err: rusqlite::Error,
    conflict_msg: impl FnOnce() -> String,
    reference_msg: impl FnOnce() -> String,
) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            match e.extended_code {
                SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY => {
                    Error::Conflict(conflict_msg())
                }
                SQLITE_CONSTRAINT_FOREIGNKEY => Error::InvalidReference(reference_msg()),
                _ => Error::Database(err),
            }
        }
        _ => Error::Database(err),
    }
}
