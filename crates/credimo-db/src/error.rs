//! Database-specific error types and conversions.

use credimo_core::error::CredimoError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Row decode failed: {0}")]
    Decode(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for CredimoError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CredimoError::NotFound { entity, id },
            DbError::Hash(message) => CredimoError::Crypto(message),
            other => CredimoError::Database(other.to_string()),
        }
    }
}
