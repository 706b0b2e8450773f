//! Database-specific error types and conversions.

use campus_core::error::CampusError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed row: {0}")]
    InvalidRow(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity} already exists")]
    AlreadyExists { entity: String },
}

impl From<DbError> for CampusError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CampusError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => CampusError::AlreadyExists { entity },
            other => CampusError::Database(other.to_string()),
        }
    }
}

/// Map a failed statement to [`DbError`], recognising unique-index
/// violations so callers see `AlreadyExists` instead of a raw message.
pub(crate) fn statement_error(entity: &str, err: surrealdb::Error) -> DbError {
    let message = err.to_string();
    if message.contains("already contains") || message.contains("already exists") {
        DbError::AlreadyExists {
            entity: entity.into(),
        }
    } else {
        DbError::Query(message)
    }
}
