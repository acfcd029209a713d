//! Money type
//!
//! Domain primitive for monetary values held in integer minor units.
//! Arithmetic is currency-strict: combining two different currencies is an
//! error, never an implicit conversion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum and maximum length of a currency code
const MIN_CODE_LEN: usize = 3;
const MAX_CODE_LEN: usize = 8;

/// Errors that can occur when creating or combining Money
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot combine {left} with {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    #[error("Amount overflow")]
    Overflow,

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Amount must not be negative (got {0})")]
    Negative(i64),
}

/// ISO-like currency code, e.g. `GBP`.
///
/// # Invariants
/// - 3 to 8 characters
/// - ASCII uppercase letters and digits only
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Result<Self, MoneyError> {
        let code = code.into();
        let valid_len = (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&code.len());
        let valid_chars = code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());

        if !valid_len || !valid_chars {
            return Err(MoneyError::InvalidCurrency(code));
        }

        Ok(Self(code))
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// Money represents an amount of a currency in minor units (e.g. pence).
///
/// # Example
/// ```
/// use game_platform::domain::{Currency, Money};
///
/// let gbp = Currency::new("GBP").unwrap();
/// let total = Money::new(500, gbp.clone()).add(&Money::new(250, gbp)).unwrap();
/// assert_eq!(total.amount(), 750);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    pub fn has_same_currency(&self, other: &Money) -> bool {
        self.currency == other.currency
    }

    /// Currency-preserving addition.
    ///
    /// # Errors
    /// - `MoneyError::CurrencyMismatch` if the currencies differ
    /// - `MoneyError::Overflow` if the sum does not fit in an `i64`
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    /// Currency-preserving subtraction. The result may be negative.
    pub fn subtract(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    /// Compare two amounts of the same currency.
    pub fn greater_than_or_equal(&self, other: &Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount >= other.amount)
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if !self.has_same_currency(other) {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Fold a sequence of Money values into one, starting from zero in `currency`.
///
/// Fails on the first value whose currency differs from the running total.
pub fn sum<'a, I>(currency: Currency, values: I) -> Result<Money, MoneyError>
where
    I: IntoIterator<Item = &'a Money>,
{
    values
        .into_iter()
        .try_fold(Money::zero(currency), |total, value| total.add(value))
}
