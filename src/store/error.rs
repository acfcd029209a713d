//! Store Errors
//!
//! Error types shared by every persistence adapter.

use crate::domain::DomainError;

/// Errors that can occur in a store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Requested record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness constraint rejected the write
    #[error("{0}")]
    AlreadyExists(String),

    /// A unique field of an entity is already taken
    #[error("{entity} with {field} '{value}' already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Bounded insert rejected because the limit is already reached
    #[error("Capacity of {capacity} reached for {entity} {id}")]
    CapacityReached {
        entity: &'static str,
        id: String,
        capacity: u32,
    },

    /// The write would break a business rule enforced by the store
    #[error(transparent)]
    Rejected(#[from] DomainError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Data that cannot be written or was read back in an invalid shape
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// `<Entity> with <field> '<value>' does not exist`
    pub fn not_found(entity: &str, field: &str, value: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} with {} '{}' does not exist", entity, field, value))
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists(message.into())
    }

    /// `<Entity> with <field> '<value>' already exists`
    pub fn duplicate(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            field,
            value: value.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            StoreError::AlreadyExists(_) | StoreError::Duplicate { .. }
        )
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
