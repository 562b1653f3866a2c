//! Account store boundary.
//!
//! The store exclusively owns account and transaction rows. Everything that
//! mutates a balance goes through a guarded delta, either as a standalone
//! atomic operation or inside a [`LedgerUnit`].

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use ledgerbank_core::{AccountId, AccountNumber, TransactionId};
use ledgerbank_ledger::{
    Account, BalanceGuard, Money, NewAccount, TransactionFilter, TransactionRecord, TransactionView,
};

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;

/// Store operation error.
///
/// These are **infrastructure errors**; "no row affected" outcomes are
/// reported through return values, not through this type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique value (e.g. email) already exists.
    #[error("duplicate value: {0}")]
    Duplicate(String),

    /// The row is referenced by recorded transactions.
    #[error("row is still referenced: {0}")]
    Referenced(String),

    /// A balance would leave the storable range.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// Connectivity, driver or unexpected database failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// An open atomic unit (all-or-nothing).
///
/// Nothing applied through a unit is visible to other callers before
/// [`LedgerUnit::commit`]. Dropping a unit without committing rolls it back.
#[async_trait]
pub trait LedgerUnit: Send {
    /// Take exclusive row locks in the given order.
    async fn lock_accounts(&mut self, accounts: &[AccountNumber]) -> Result<(), StoreError>;

    /// Add `delta` to the balance of `account` if `guard` admits the current
    /// balance and the result is non-negative. The check and the mutation are
    /// a single atomic step. Returns the number of rows affected (0 or 1);
    /// a result above the storable maximum is `StoreError::OutOfRange`.
    async fn apply_balance_delta(
        &mut self,
        account: AccountNumber,
        delta: Money,
        guard: BalanceGuard,
    ) -> Result<u64, StoreError>;

    /// Record an immutable transaction fact.
    async fn insert_transaction(&mut self, record: &TransactionRecord) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Persistence capability consumed by the ledger services.
///
/// Implementations must:
/// - assign unique account numbers at creation
/// - enforce email uniqueness
/// - evaluate balance guards atomically with the mutation
/// - refuse to delete accounts referenced by transactions
/// - serve transaction views as a live join against current account rows
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a new account with zero balance and a fresh account number.
    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn get_account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn get_account_by_number(
        &self,
        number: AccountNumber,
    ) -> Result<Option<Account>, StoreError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Returns the number of rows deleted.
    async fn delete_account(&self, id: AccountId) -> Result<u64, StoreError>;

    /// Open an atomic unit.
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError>;

    /// Standalone guarded delta, committed on its own.
    async fn apply_balance_delta(
        &self,
        account: AccountNumber,
        delta: Money,
        guard: BalanceGuard,
    ) -> Result<u64, StoreError> {
        let mut unit = self.begin().await?;
        let rows = unit.apply_balance_delta(account, delta, guard).await?;
        unit.commit().await?;
        Ok(rows)
    }

    async fn find_transaction_view(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionView>, StoreError>;

    async fn transaction_views(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionView>, StoreError>;
}
