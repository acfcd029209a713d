//! User Orchestrator
//!
//! Registration, lookup and credential checks. A user is always created
//! together with an empty purse.

use std::sync::Arc;

use crate::aggregate::{Aggregate, User, UserPurse};
use crate::domain::password::DEFAULT_COST;
use crate::domain::{Currency, DomainError, Money, PasswordHash, UserId};
use crate::error::{AppError, AppResult};
use crate::store::{PurseWriter, StoreError, UserReader, UserWriter};

use super::{CreateUserCommand, UpdateUserCommand};

/// Coordinates the user registry and purse creation
pub struct UserOrchestrator {
    reader: Arc<dyn UserReader>,
    writer: Arc<dyn UserWriter>,
    purses: Arc<dyn PurseWriter>,
    hash_cost: u32,
}

impl UserOrchestrator {
    pub fn new(
        reader: Arc<dyn UserReader>,
        writer: Arc<dyn UserWriter>,
        purses: Arc<dyn PurseWriter>,
    ) -> Self {
        Self {
            reader,
            writer,
            purses,
            hash_cost: DEFAULT_COST,
        }
    }

    /// bcrypt work factor for new password hashes
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Register a user and open a zero-balance purse in `currency`.
    ///
    /// Email is checked before username. If the purse cannot be created the
    /// user is deleted again and [`DomainError::PurseCreation`] is returned.
    pub async fn create_user(&self, user: User, currency: Currency) -> AppResult<User> {
        if self.user_exists_with_email(user.email()).await? {
            tracing::debug!(email = %user.email(), "Registration rejected: email taken");
            return Err(email_taken(user.email()));
        }

        if self.user_exists_with_username(user.username()).await? {
            tracing::debug!(username = %user.username(), "Registration rejected: username taken");
            return Err(username_taken(user.username()));
        }

        let user = self.writer.insert(&user).await.map_err(user_conflict)?;

        let purse = UserPurse::new(user.id(), Money::zero(currency));
        if let Err(e) = self.purses.insert(&purse).await {
            tracing::error!(user_id = %user.id(), error = %e, "Purse creation failed, removing user");
            if let Err(undo) = self.writer.delete(user.id()).await {
                tracing::error!(
                    user_id = %user.id(),
                    error = %undo,
                    "Compensating user delete failed"
                );
            }
            return Err(DomainError::PurseCreation(format!(
                "Unable to create purse for User {}",
                user.id()
            ))
            .into());
        }

        tracing::info!(user_id = %user.id(), username = %user.username(), "User created");
        Ok(user)
    }

    /// Build a user from a registration command and create it
    pub async fn register(
        &self,
        command: CreateUserCommand,
        default_currency: &Currency,
    ) -> AppResult<User> {
        let currency = command
            .currency
            .unwrap_or_else(|| default_currency.clone());
        let password_hash = self.hash_password(command.password).await?;
        let user = User::new(UserId::new(), command.email, command.username, password_hash);
        self.create_user(user, currency).await
    }

    pub async fn get_user_by_id(&self, id: UserId) -> AppResult<User> {
        Ok(self.reader.get_by_id(id).await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> AppResult<User> {
        Ok(self.reader.get_by_email(email).await?)
    }

    pub async fn get_user_by_username(&self, username: &str) -> AppResult<User> {
        Ok(self.reader.get_by_username(username).await?)
    }

    /// All users, oldest first
    pub async fn get_users(&self) -> AppResult<Vec<User>> {
        Ok(self.reader.get_users().await?)
    }

    /// Apply the present fields of `command` to an existing user
    pub async fn update_user(&self, id: UserId, command: UpdateUserCommand) -> AppResult<User> {
        let mut user = self.reader.get_by_id(id).await?;

        if let Some(email) = command.email {
            if email != user.email() && self.user_exists_with_email(&email).await? {
                return Err(email_taken(&email));
            }
            user = user.with_email(email);
        }
        if let Some(username) = command.username {
            if username != user.username() && self.user_exists_with_username(&username).await? {
                return Err(username_taken(&username));
            }
            user = user.with_username(username);
        }
        if let Some(password) = command.password {
            user = user.with_password_hash(self.hash_password(password).await?);
        }

        let user = self.writer.update(&user).await.map_err(user_conflict)?;
        tracing::info!(user_id = %user.id(), "User updated");
        Ok(user)
    }

    /// Delete a user; the purse and game entries go with it
    pub async fn delete_user(&self, id: UserId) -> AppResult<()> {
        self.writer.delete(id).await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Look up a user by email and check the password against the stored hash.
    pub async fn verify_user(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self.reader.get_by_email(email).await?;

        let hash = user.password_hash().clone();
        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || hash.verify(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification panicked: {}", e)))?;

        if !verified {
            tracing::debug!(user_id = %user.id(), "Credential verification failed");
            return Err(DomainError::NotAuthenticated(
                "Unable to verify User with credentials provided".to_string(),
            )
            .into());
        }

        Ok(user)
    }

    /// Whether a user holds `email`. Lookup failures other than absence propagate.
    pub async fn user_exists_with_email(&self, email: &str) -> AppResult<bool> {
        Ok(self.reader.find_by_email(email).await?.is_some())
    }

    pub async fn user_exists_with_username(&self, username: &str) -> AppResult<bool> {
        Ok(self.reader.find_by_username(username).await?.is_some())
    }

    /// bcrypt is CPU bound, so it runs off the async workers
    async fn hash_password(&self, password: String) -> AppResult<PasswordHash> {
        let cost = self.hash_cost;
        tokio::task::spawn_blocking(move || PasswordHash::with_cost(&password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing panicked: {}", e)))?
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

fn email_taken(email: &str) -> AppError {
    DomainError::UserCreation(format!(
        "A user has already registered with this email address {}",
        email
    ))
    .into()
}

fn username_taken(username: &str) -> AppError {
    DomainError::UserCreation(format!(
        "A user has already registered with this username {}",
        username
    ))
    .into()
}

/// The store backstop caught a registration race. Reports it the same way the
/// pre-checks do.
fn user_conflict(err: StoreError) -> AppError {
    match err {
        StoreError::Duplicate {
            field: "email",
            value,
            ..
        } => email_taken(&value),
        StoreError::Duplicate {
            field: "username",
            value,
            ..
        } => username_taken(&value),
        other if other.is_already_exists() => DomainError::UserCreation(other.to_string()).into(),
        other => other.into(),
    }
}
