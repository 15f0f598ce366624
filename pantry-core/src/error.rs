//! Error types for the pantry persistence layer.

use thiserror::Error;

/// Errors raised by value objects, entities, repositories and the unit of work.
#[derive(Debug, Error)]
pub enum PantryError {
    /// An invariant was violated while building or changing an entity.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A write or read broke a reference between aggregates.
    #[error("Reference integrity error: {0}")]
    ReferenceIntegrity(String),

    /// begin/commit/rollback called out of sequence.
    #[error("Transaction state error: {0}")]
    TransactionState(String),

    /// Failure reported by the storage engine.
    #[error("Storage error: {0}")]
    Storage(sqlx::Error),
}

pub type Result<T> = std::result::Result<T, PantryError>;

impl PantryError {
    pub fn validation(message: impl Into<String>) -> Self {
        PantryError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        PantryError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PantryError::NotFound { .. })
    }
}

impl From<sqlx::Error> for PantryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                PantryError::ReferenceIntegrity(db_err.message().to_string())
            }
            _ => PantryError::Storage(err),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for PantryError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        PantryError::Storage(sqlx::Error::Migrate(Box::new(err)))
    }
}
