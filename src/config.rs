//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::bank;
use crate::domain::{password, Currency};

/// Storage technology behind the store ports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreDriver {
    Memory,
    Postgres,
}

impl FromStr for StoreDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(StoreDriver::Memory),
            "postgres" => Ok(StoreDriver::Postgres),
            other => Err(ConfigError::UnknownDriver {
                variable: "STORE_DRIVER",
                value: other.to_string(),
            }),
        }
    }
}

/// Driver behind the admin bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankDriver {
    Memory,
    Postgres,
    Log,
}

impl FromStr for BankDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(BankDriver::Memory),
            "postgres" => Ok(BankDriver::Postgres),
            "log" => Ok(BankDriver::Log),
            other => Err(ConfigError::UnknownDriver {
                variable: "BANK_DRIVER",
                value: other.to_string(),
            }),
        }
    }
}

/// Driver behind the entry fee store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFeeDriver {
    Memory,
    Postgres,
    Log,
}

impl FromStr for EntryFeeDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(EntryFeeDriver::Memory),
            "postgres" => Ok(EntryFeeDriver::Postgres),
            "log" => Ok(EntryFeeDriver::Log),
            other => Err(ConfigError::UnknownDriver {
                variable: "ENTRY_FEE_DRIVER",
                value: other.to_string(),
            }),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL, required by the postgres drivers
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    pub store_driver: StoreDriver,

    pub bank_driver: BankDriver,

    pub entry_fee_driver: EntryFeeDriver,

    /// bcrypt work factor for new password hashes
    pub password_hash_cost: u32,

    /// Purse currency for registrations that do not name one
    pub default_currency: Currency,

    /// Reference currency of the admin bank balance
    pub ledger_currency: Currency,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let store_driver: StoreDriver = var("STORE_DRIVER", "memory").parse()?;
        let bank_driver: BankDriver = var("BANK_DRIVER", "memory").parse()?;
        let entry_fee_driver: EntryFeeDriver = var("ENTRY_FEE_DRIVER", "memory").parse()?;

        let database_url = lookup("DATABASE_URL");
        let needs_database = store_driver == StoreDriver::Postgres
            || bank_driver == BankDriver::Postgres
            || entry_fee_driver == EntryFeeDriver::Postgres;
        if needs_database && database_url.is_none() {
            return Err(ConfigError::MissingEnv("DATABASE_URL"));
        }

        let database_max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = var("HOST", "127.0.0.1");

        let port = var("PORT", "3000")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = var("ENVIRONMENT", "development");

        let default_currency = Currency::new(var("DEFAULT_CURRENCY", "GBP"))
            .map_err(|_| ConfigError::InvalidValue("DEFAULT_CURRENCY"))?;

        let ledger_currency = Currency::new(var("LEDGER_CURRENCY", bank::DEFAULT_CURRENCY))
            .map_err(|_| ConfigError::InvalidValue("LEDGER_CURRENCY"))?;

        let password_hash_cost: u32 =
            var("PASSWORD_HASH_COST", &password::DEFAULT_COST.to_string())
                .parse()
                .ok()
                .filter(|cost| (password::MIN_COST..=password::MAX_COST).contains(cost))
                .ok_or(ConfigError::InvalidValue("PASSWORD_HASH_COST"))?;

        let log_format = match var("LOG_FORMAT", "pretty").as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            _ => return Err(ConfigError::InvalidValue("LOG_FORMAT")),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            store_driver,
            bank_driver,
            entry_fee_driver,
            password_hash_cost,
            default_currency,
            ledger_currency,
            log_format,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether any driver needs a database pool
    pub fn needs_database(&self) -> bool {
        self.store_driver == StoreDriver::Postgres
            || self.bank_driver == BankDriver::Postgres
            || self.entry_fee_driver == EntryFeeDriver::Postgres
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("Unknown driver '{value}' for {variable}")]
    UnknownDriver {
        variable: &'static str,
        value: String,
    },
}
