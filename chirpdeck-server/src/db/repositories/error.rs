use rusqlite::ErrorCode;
use thiserror::Error;

use crate::credentials::CredentialError;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error(transparent)]
    InvalidCredentials(#[from] CredentialError),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Whether a statement failed on a UNIQUE or PRIMARY KEY constraint
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}
