use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use ledgerbank_core::{AccountId, AccountNumber, TransactionId};
use ledgerbank_ledger::{
    Account, BalanceGuard, DeltaOutcome, Money, NewAccount, TransactionFilter, TransactionRecord,
    TransactionView, apply_delta,
};

use super::{LedgerStore, LedgerUnit, StoreError};

/// First account number handed out; later accounts count up from here.
pub const FIRST_ACCOUNT_NUMBER: i64 = 10_000_001;

#[derive(Debug, Clone, Default)]
struct Tables {
    accounts: BTreeMap<AccountId, Account>,
    transactions: Vec<TransactionRecord>,
    sequence: i64,
}

impl Tables {
    fn by_number(&self, number: AccountNumber) -> Option<&Account> {
        self.accounts.values().find(|a| a.account_number == number)
    }

    fn by_number_mut(&mut self, number: AccountNumber) -> Option<&mut Account> {
        self.accounts.values_mut().find(|a| a.account_number == number)
    }

    fn apply_delta(
        &mut self,
        number: AccountNumber,
        delta: Money,
        guard: BalanceGuard,
    ) -> Result<u64, StoreError> {
        let Some(account) = self.by_number_mut(number) else {
            return Ok(0);
        };
        match delta_rows(number, account.balance, delta, guard)? {
            Some(next) => {
                account.balance = next;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    /// Inner join: a record whose parties are missing yields no view.
    fn join(&self, record: &TransactionRecord) -> Option<TransactionView> {
        let sender = self.by_number(record.sender)?;
        let receiver = self.by_number(record.receiver)?;
        Some(TransactionView::join(record, sender, receiver))
    }
}

/// `Ok(None)` means no row affected.
fn delta_rows(
    number: AccountNumber,
    balance: Money,
    delta: Money,
    guard: BalanceGuard,
) -> Result<Option<Money>, StoreError> {
    match apply_delta(balance, delta, guard) {
        DeltaOutcome::Applied(next) => Ok(Some(next)),
        DeltaOutcome::Refused => Ok(None),
        DeltaOutcome::OutOfRange => Err(StoreError::OutOfRange(format!(
            "balance of account {number} would exceed {}",
            Money::max_magnitude()
        ))),
    }
}

/// In-memory ledger store.
///
/// Intended for tests/dev. Not optimized for performance: a unit holds the
/// store's single lock for its whole lifetime, so units are fully serialized.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Pending writes of one unit, layered over the locked tables. Only touched
/// balances and appended records are staged; commit writes them through.
struct InMemoryUnit {
    tables: OwnedMutexGuard<Tables>,
    balances: BTreeMap<AccountNumber, Money>,
    appended: Vec<TransactionRecord>,
}

impl InMemoryUnit {
    fn balance_of(&self, number: AccountNumber) -> Option<Money> {
        self.balances
            .get(&number)
            .copied()
            .or_else(|| self.tables.by_number(number).map(|a| a.balance))
    }
}

#[async_trait]
impl LedgerUnit for InMemoryUnit {
    async fn lock_accounts(&mut self, _accounts: &[AccountNumber]) -> Result<(), StoreError> {
        // The unit already holds the store-wide lock.
        Ok(())
    }

    async fn apply_balance_delta(
        &mut self,
        account: AccountNumber,
        delta: Money,
        guard: BalanceGuard,
    ) -> Result<u64, StoreError> {
        let Some(balance) = self.balance_of(account) else {
            return Ok(0);
        };
        match delta_rows(account, balance, delta, guard)? {
            Some(next) => {
                self.balances.insert(account, next);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn insert_transaction(&mut self, record: &TransactionRecord) -> Result<(), StoreError> {
        for number in [record.sender, record.receiver] {
            if self.tables.by_number(number).is_none() {
                return Err(StoreError::Referenced(format!(
                    "transaction references unknown account {number}"
                )));
            }
        }
        let duplicate = self
            .tables
            .transactions
            .iter()
            .chain(self.appended.iter())
            .any(|t| t.id == record.id);
        if duplicate {
            return Err(StoreError::Duplicate(format!("transaction {}", record.id)));
        }
        self.appended.push(record.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryUnit {
            mut tables,
            balances,
            appended,
        } = *self;
        for (number, balance) in balances {
            if let Some(account) = tables.by_number_mut(number) {
                account.balance = balance;
            }
        }
        tables.transactions.extend(appended);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::Duplicate(format!(
                "email '{}' already in use",
                account.email
            )));
        }

        tables.sequence += 1;
        let id = AccountId::new(tables.sequence);
        let number = AccountNumber::new(FIRST_ACCOUNT_NUMBER + tables.sequence - 1);
        let created = account.into_account(id, number);
        tables.accounts.insert(id, created.clone());
        Ok(created)
    }

    async fn get_account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.tables.lock().await.accounts.get(&id).cloned())
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn get_account_by_number(
        &self,
        number: AccountNumber,
    ) -> Result<Option<Account>, StoreError> {
        Ok(self.tables.lock().await.by_number(number).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.tables.lock().await.accounts.values().cloned().collect())
    }

    async fn delete_account(&self, id: AccountId) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(number) = tables.accounts.get(&id).map(|a| a.account_number) else {
            return Ok(0);
        };
        if tables.transactions.iter().any(|t| t.involves(number)) {
            return Err(StoreError::Referenced(format!(
                "account {number} is referenced by recorded transactions"
            )));
        }
        tables.accounts.remove(&id);
        Ok(1)
    }

    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError> {
        let tables = Arc::clone(&self.tables).lock_owned().await;
        Ok(Box::new(InMemoryUnit {
            tables,
            balances: BTreeMap::new(),
            appended: Vec::new(),
        }))
    }

    async fn apply_balance_delta(
        &self,
        account: AccountNumber,
        delta: Money,
        guard: BalanceGuard,
    ) -> Result<u64, StoreError> {
        self.tables.lock().await.apply_delta(account, delta, guard)
    }

    async fn find_transaction_view(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionView>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .transactions
            .iter()
            .find(|t| t.id == id)
            .and_then(|t| tables.join(t)))
    }

    async fn transaction_views(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionView>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .transactions
            .iter()
            .filter(|t| filter.matches(t))
            .filter_map(|t| tables.join(t))
            .collect())
    }
}
