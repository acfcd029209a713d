//! User Aggregate
//!
//! Registered user identity and credentials.

use chrono::{DateTime, Utc};

use crate::domain::{PasswordHash, UserId};

use super::Aggregate;

/// User Aggregate
///
/// Email and username are unique across the registry; that rule is enforced
/// by the user orchestrator, with a store constraint as a backstop.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Unique user ID, assigned at creation
    id: UserId,

    /// Email (unique)
    email: String,

    /// Username (unique)
    username: String,

    /// One-way password hash
    password_hash: PasswordHash,

    /// Set by the store on insert
    created_at: Option<DateTime<Utc>>,

    /// Set by the store on insert and update
    updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        username: impl Into<String>,
        password_hash: PasswordHash,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            username: username.into(),
            password_hash,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_password_hash(mut self, password_hash: PasswordHash) -> Self {
        self.password_hash = password_hash;
        self
    }

    /// Attach store-assigned timestamps
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Aggregate for User {
    type Id = UserId;

    fn aggregate_type() -> &'static str {
        "User"
    }

    fn id(&self) -> UserId {
        self.id
    }
}
