//! User Purse Aggregate
//!
//! One monetary balance per user.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{DomainError, Money, MoneyError, UserId};

use super::Aggregate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPurse {
    user_id: UserId,
    balance: Money,
    created_at: Option<DateTime<Utc>>,
}

impl UserPurse {
    pub fn new(user_id: UserId, balance: Money) -> Self {
        Self {
            user_id,
            balance,
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn balance(&self) -> &Money {
        &self.balance
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Add money to the purse
    pub fn credit(&self, amount: &Money) -> Result<UserPurse, DomainError> {
        ensure_not_negative(amount)?;
        let balance = self.balance.add(amount)?;
        Ok(Self {
            balance,
            ..self.clone()
        })
    }

    /// Take money from the purse; the balance may not go below zero
    pub fn debit(&self, amount: &Money) -> Result<UserPurse, DomainError> {
        ensure_not_negative(amount)?;
        if !self.balance.greater_than_or_equal(amount)? {
            return Err(DomainError::InsufficientFunds {
                required: amount.amount(),
                available: self.balance.amount(),
            });
        }
        let balance = self.balance.subtract(amount)?;
        Ok(Self {
            balance,
            ..self.clone()
        })
    }
}

impl UserPurse {
    /// Apply a signed change: positive amounts credit, negative amounts debit.
    pub fn apply_delta(&self, delta: &Money) -> Result<UserPurse, DomainError> {
        if !delta.is_negative() {
            return self.credit(delta);
        }
        let amount = delta.amount().checked_neg().ok_or(MoneyError::Overflow)?;
        self.debit(&Money::new(amount, delta.currency().clone()))
    }
}

fn ensure_not_negative(amount: &Money) -> Result<(), MoneyError> {
    if amount.is_negative() {
        return Err(MoneyError::Negative(amount.amount()));
    }
    Ok(())
}

impl Aggregate for UserPurse {
    type Id = UserId;

    fn aggregate_type() -> &'static str {
        "UserPurse"
    }

    fn id(&self) -> UserId {
        self.user_id
    }
}
