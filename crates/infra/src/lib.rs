//! Infrastructure layer: account store adapters, ledger services, config.

pub mod accounts;
pub mod config;
pub mod engine;
pub mod error;
pub mod query;
pub mod store;

pub use accounts::{AccountService, AuthenticatedAccount, Registration};
pub use config::{ConfigError, DatabaseConfig, LedgerConfig};
pub use engine::{TopUpReceipt, TransferEngine};
pub use error::LedgerError;
pub use query::TransactionQueryService;
pub use store::{InMemoryLedgerStore, LedgerStore, LedgerUnit, PostgresLedgerStore, StoreError};
