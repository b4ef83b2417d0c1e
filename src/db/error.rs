use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors raised by the [`Store`](super::Store).
///
/// Only [`StoreError::DuplicateUrl`] is expected during normal operation; the caller
/// must roll back before the store is usable again. Everything else is fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A show with url {0} already exists")]
    DuplicateUrl(String),

    #[error("Show {0} has not been saved yet")]
    UnsavedShow(String),

    #[error("Unsupported database backend: {0}")]
    UnsupportedBackend(String),

    #[error("The store has been closed")]
    Closed,

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Translates a failed show write, surfacing unique-key clashes on `url`.
    pub(crate) fn from_show_write(err: DbErr, url: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::DuplicateUrl(url.to_string()),
            _ => Self::Database(err),
        }
    }

    #[must_use]
    pub const fn is_duplicate_url(&self) -> bool {
        matches!(self, Self::DuplicateUrl(_))
    }
}
