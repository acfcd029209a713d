//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::bank::BankError;
use crate::domain::{DomainError, GameEntryViolation};
use crate::entry_fee::EntryFeeError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Bank error: {0}")]
    Bank(BankError),

    #[error("Entry fee error: {0}")]
    EntryFee(EntryFeeError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// The domain error, if this is one
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            AppError::Domain(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.domain().is_some_and(DomainError::is_not_found)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::Domain(DomainError::NotFound(msg)),
            StoreError::AlreadyExists(msg) => AppError::Domain(DomainError::DuplicateRecord(msg)),
            StoreError::Duplicate { .. } => {
                AppError::Domain(DomainError::DuplicateRecord(err.to_string()))
            }
            StoreError::Rejected(e) => AppError::Domain(e),
            StoreError::CapacityReached { .. } => {
                AppError::Domain(DomainError::GameEntry(GameEntryViolation::FullCapacity))
            }
            other => AppError::Store(other),
        }
    }
}

impl From<BankError> for AppError {
    fn from(err: BankError) -> Self {
        match err {
            BankError::DuplicateRecord(_) => {
                AppError::Domain(DomainError::DuplicateRecord(err.to_string()))
            }
            BankError::Money(e) => AppError::Domain(DomainError::Money(e)),
            other => AppError::Bank(other),
        }
    }
}

impl From<EntryFeeError> for AppError {
    fn from(err: EntryFeeError) -> Self {
        match err {
            EntryFeeError::DuplicateRecord { .. } => {
                AppError::Domain(DomainError::DuplicateRecord(err.to_string()))
            }
            EntryFeeError::NotFound { .. } => AppError::Domain(DomainError::NotFound(err.to_string())),
            EntryFeeError::Money(e) => AppError::Domain(DomainError::Money(e)),
            other => AppError::EntryFee(other),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }
            AppError::MissingHeader(header) => {
                (StatusCode::BAD_REQUEST, "missing_header", Some(header.clone()))
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
                DomainError::DuplicateRecord(_) => {
                    (StatusCode::CONFLICT, "duplicate_record", None)
                }
                DomainError::UserCreation(_) => (StatusCode::CONFLICT, "user_creation", None),
                DomainError::GameEntry(violation) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, violation.code(), None)
                }
                DomainError::NotAuthenticated(_) => {
                    (StatusCode::UNAUTHORIZED, "not_authenticated", None)
                }
                DomainError::InsufficientFunds { .. } => {
                    (StatusCode::BAD_REQUEST, "insufficient_funds", None)
                }
                DomainError::InvalidGame(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_game", Some(msg.clone()))
                }
                DomainError::Money(e) => {
                    (StatusCode::BAD_REQUEST, "invalid_money", Some(e.to_string()))
                }
                DomainError::PurseCreation(msg) => {
                    tracing::error!("Purse creation failed: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "purse_creation", None)
                }
            },

            // 500 Internal Server Error
            AppError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
            }
            AppError::Bank(e) => {
                tracing::error!("Bank error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "bank_error", None)
            }
            AppError::EntryFee(e) => {
                tracing::error!("Entry fee error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "entry_fee_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_becomes_domain_not_found() {
        let err: AppError = StoreError::not_found("User", "ID", "42").into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "User with ID '42' does not exist");
    }

    #[test]
    fn test_store_duplicate_becomes_duplicate_record() {
        let err: AppError = StoreError::already_exists("taken").into();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::DuplicateRecord(_))
        ));
    }

    #[test]
    fn test_store_rejection_keeps_domain_error() {
        let err: AppError = StoreError::Rejected(DomainError::InsufficientFunds {
            required: 10,
            available: 5,
        })
        .into();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::InsufficientFunds {
                required: 10,
                available: 5
            })
        ));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_capacity_becomes_full_capacity() {
        let err: AppError = StoreError::CapacityReached {
            entity: "Game",
            id: "g".to_string(),
            capacity: 2,
        }
        .into();
        assert_eq!(err.to_string(), "Game has reached full capacity");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::from(DomainError::not_found("x")), StatusCode::NOT_FOUND),
            (
                AppError::from(DomainError::UserCreation("x".to_string())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(DomainError::game_entry(GameEntryViolation::AlreadyStarted)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(DomainError::NotAuthenticated("x".to_string())),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::from(DomainError::PurseCreation("x".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::MissingHeader("X-Request-User-Id".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
