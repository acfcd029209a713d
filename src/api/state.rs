//! Application state
//!
//! Wires the orchestrators to a concrete store, bank and fee store once at
//! startup.

use std::sync::Arc;

use sqlx::PgPool;

use crate::bank::{Bank, LogBank, MemoryBank, PgBank};
use crate::clock::SharedClock;
use crate::config::{BankDriver, Config, EntryFeeDriver, StoreDriver};
use crate::domain::Currency;
use crate::entry_fee::{EntryFeeStore, LogEntryFeeStore, MemoryEntryFeeStore, PgEntryFeeStore};
use crate::error::{AppError, AppResult};
use crate::orchestrator::{
    GameEntryOrchestrator, GameOrchestrator, PurseOrchestrator, UserOrchestrator,
};
use crate::store::{
    GameEntryRepository, GameReader, GameWriter, MemoryStore, PgStore, PurseReader, PurseWriter,
    UserReader, UserWriter,
};

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserOrchestrator>,
    pub purses: Arc<PurseOrchestrator>,
    pub games: Arc<GameOrchestrator>,
    pub entries: Arc<GameEntryOrchestrator>,
    pub bank: Arc<dyn Bank>,
    /// Purse currency when a registration does not name one
    pub default_currency: Currency,
}

/// Ledger drivers that sit beside the store
pub struct Ledgers {
    pub bank: Arc<dyn Bank>,
    pub fees: Arc<dyn EntryFeeStore>,
}

impl AppState {
    /// Build state over one store implementing every port
    pub fn with_store<S>(
        store: Arc<S>,
        ledgers: Ledgers,
        clock: SharedClock,
        config: &Config,
    ) -> Self
    where
        S: UserReader
            + UserWriter
            + PurseReader
            + PurseWriter
            + GameReader
            + GameWriter
            + GameEntryRepository
            + 'static,
    {
        let users = UserOrchestrator::new(store.clone(), store.clone(), store.clone())
            .with_hash_cost(config.password_hash_cost);

        Self {
            users: Arc::new(users),
            purses: Arc::new(PurseOrchestrator::new(store.clone(), store.clone())),
            games: Arc::new(GameOrchestrator::new(store.clone(), store.clone())),
            entries: Arc::new(GameEntryOrchestrator::new(
                store.clone(),
                store.clone(),
                store,
                ledgers.fees,
                clock,
            )),
            bank: ledgers.bank,
            default_currency: config.default_currency.clone(),
        }
    }

    /// Memory store, memory bank and memory fee store, whatever drivers
    /// `config` names
    pub fn in_memory(config: &Config, clock: SharedClock) -> Self {
        Self::with_store(
            Arc::new(MemoryStore::new(clock.clone())),
            Ledgers {
                bank: Arc::new(MemoryBank::new(config.ledger_currency.clone())),
                fees: Arc::new(MemoryEntryFeeStore::new()),
            },
            clock,
            config,
        )
    }

    /// Build state from the configured drivers.
    ///
    /// `pool` must be present when any driver is `postgres`.
    pub fn from_config(
        config: &Config,
        pool: Option<PgPool>,
        clock: SharedClock,
    ) -> AppResult<Self> {
        let require_pool = || {
            pool.clone().ok_or_else(|| {
                AppError::Internal("database pool required by postgres driver".to_string())
            })
        };

        let bank: Arc<dyn Bank> = match config.bank_driver {
            BankDriver::Memory => Arc::new(MemoryBank::new(config.ledger_currency.clone())),
            BankDriver::Postgres => {
                Arc::new(PgBank::new(require_pool()?, config.ledger_currency.clone()))
            }
            BankDriver::Log => Arc::new(LogBank::new(config.ledger_currency.clone())),
        };

        let fees: Arc<dyn EntryFeeStore> = match config.entry_fee_driver {
            EntryFeeDriver::Memory => Arc::new(MemoryEntryFeeStore::new()),
            EntryFeeDriver::Postgres => Arc::new(PgEntryFeeStore::new(require_pool()?)),
            EntryFeeDriver::Log => Arc::new(LogEntryFeeStore::new()),
        };

        let ledgers = Ledgers { bank, fees };
        let state = match config.store_driver {
            StoreDriver::Memory => Self::with_store(
                Arc::new(MemoryStore::new(clock.clone())),
                ledgers,
                clock,
                config,
            ),
            StoreDriver::Postgres => Self::with_store(
                Arc::new(PgStore::new(require_pool()?)),
                ledgers,
                clock,
                config,
            ),
        };

        Ok(state)
    }
}
