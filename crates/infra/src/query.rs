//! Read side: enriched transaction views.

use std::sync::Arc;

use tracing::instrument;

use ledgerbank_core::{AccountNumber, TransactionId};
use ledgerbank_ledger::{TransactionFilter, TransactionView};

use crate::error::LedgerError;
use crate::store::LedgerStore;

/// Every call re-executes the join against current account rows, so party
/// balances reflect the present, not the moment of the transfer.
#[derive(Clone)]
pub struct TransactionQueryService {
    store: Arc<dyn LedgerStore>,
}

impl TransactionQueryService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self), fields(transaction_id = %id), err)]
    pub async fn get_transaction_by_id(
        &self,
        id: TransactionId,
    ) -> Result<TransactionView, LedgerError> {
        self.store
            .find_transaction_view(id)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("transaction {id}")))
    }

    /// Transactions where `account` is sender or receiver. An unknown
    /// account simply has none.
    pub async fn get_transactions_for_account(
        &self,
        account: AccountNumber,
    ) -> Result<Vec<TransactionView>, LedgerError> {
        Ok(self
            .store
            .transaction_views(TransactionFilter::Account(account))
            .await?)
    }

    pub async fn list_all_transactions(&self) -> Result<Vec<TransactionView>, LedgerError> {
        Ok(self.store.transaction_views(TransactionFilter::All).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLedgerStore;
    use chrono::Utc;
    use ledgerbank_ledger::{Money, NewAccount, TransactionRecord};

    async fn seeded() -> (Arc<InMemoryLedgerStore>, Vec<AccountNumber>) {
        let store = Arc::new(InMemoryLedgerStore::new());
        let mut numbers = Vec::new();
        for email in ["a@bank.test", "b@bank.test", "c@bank.test"] {
            let account = store
                .create_account(NewAccount::new("F", "L", email, "hash").unwrap())
                .await
                .unwrap();
            numbers.push(account.account_number);
        }

        let mut unit = store.begin().await.unwrap();
        for (from, to) in [(0, 1), (1, 2)] {
            let record = TransactionRecord::transfer(
                numbers[from],
                numbers[to],
                Money::parse("1.00").unwrap(),
                Utc::now(),
            )
            .unwrap();
            unit.insert_transaction(&record).await.unwrap();
        }
        unit.commit().await.unwrap();
        (store, numbers)
    }

    #[tokio::test]
    async fn filters_by_either_party() {
        let (store, numbers) = seeded().await;
        let queries = TransactionQueryService::new(store);

        assert_eq!(queries.list_all_transactions().await.unwrap().len(), 2);
        assert_eq!(
            queries
                .get_transactions_for_account(numbers[1])
                .await
                .unwrap()
                .len(),
            2
        );
        let only_c = queries.get_transactions_for_account(numbers[2]).await.unwrap();
        assert_eq!(only_c.len(), 1);
        assert_eq!(only_c[0].receiver_account.account_number, numbers[2]);
    }

    #[tokio::test]
    async fn unknown_account_has_no_transactions() {
        let (store, _) = seeded().await;
        let queries = TransactionQueryService::new(store);
        let none = queries
            .get_transactions_for_account(AccountNumber::new(1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn unknown_transaction_is_not_found() {
        let (store, _) = seeded().await;
        let queries = TransactionQueryService::new(store);
        let err = queries
            .get_transaction_by_id(TransactionId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }
}
