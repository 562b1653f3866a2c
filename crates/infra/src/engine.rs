//! Transfer engine: the only component that moves money.
//!
//! ## Transfer
//!
//! One atomic unit per transfer:
//!
//! 1. lock both rows (ascending account number)
//! 2. guarded debit of the sender, refused unless `balance >= amount`
//! 3. credit of the receiver
//! 4. append the transaction record
//! 5. commit
//!
//! Any failure rolls the whole unit back. Steps 1-4 are bounded by the
//! configured timeout; an expired unit is dropped, which also rolls it back.
//! The commit runs outside the bound, so a unit that reached it is never
//! abandoned halfway through committing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};

use ledgerbank_core::AccountNumber;
use ledgerbank_ledger::{
    BalanceGuard, Money, TopUp, TransactionRecord, TransactionView, Transfer,
};

use crate::error::LedgerError;
use crate::query::TransactionQueryService;
use crate::store::{LedgerStore, LedgerUnit};

/// Outcome of a successful top-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopUpReceipt {
    pub account: AccountNumber,
    pub amount: Money,
}

pub struct TransferEngine {
    store: Arc<dyn LedgerStore>,
    queries: TransactionQueryService,
    unit_timeout: Duration,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn LedgerStore>, unit_timeout: Duration) -> Self {
        Self {
            queries: TransactionQueryService::new(store.clone()),
            store,
            unit_timeout,
        }
    }

    /// Move `amount` from `from` to `to` and return the enriched record.
    #[instrument(skip(self), fields(from = %from, to = %to), err)]
    pub async fn transfer(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        amount: &str,
    ) -> Result<TransactionView, LedgerError> {
        let transfer = Transfer::new(from, to, amount)?;

        let (unit, record) = self.bounded(self.stage_transfer(&transfer)).await?;
        unit.commit().await?;
        info!(
            transaction_id = %record.id,
            amount = %transfer.amount,
            "transfer committed"
        );

        self.queries.get_transaction_by_id(record.id).await
    }

    /// Credit `amount` to `account`. No transaction record is written.
    #[instrument(skip(self), fields(account = %account), err)]
    pub async fn top_up(
        &self,
        account: AccountNumber,
        amount: &str,
    ) -> Result<TopUpReceipt, LedgerError> {
        let top_up = TopUp::new(account, amount)?;

        let unit = self.bounded(self.stage_top_up(&top_up)).await?;
        unit.commit().await?;

        info!(amount = %top_up.amount, "account funded");
        Ok(TopUpReceipt {
            account: top_up.account,
            amount: top_up.amount,
        })
    }

    async fn bounded<T, F>(&self, unit: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        match tokio::time::timeout(self.unit_timeout, unit).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.unit_timeout, "atomic unit timed out; rolled back");
                Err(LedgerError::Timeout(self.unit_timeout))
            }
        }
    }

    async fn stage_transfer(
        &self,
        transfer: &Transfer,
    ) -> Result<(Box<dyn LedgerUnit>, TransactionRecord), LedgerError> {
        let mut unit = self.store.begin().await?;
        match apply_transfer(unit.as_mut(), transfer).await {
            Ok(record) => Ok((unit, record)),
            Err(err) => {
                discard(unit).await;
                Err(err)
            }
        }
    }

    async fn stage_top_up(&self, top_up: &TopUp) -> Result<Box<dyn LedgerUnit>, LedgerError> {
        let mut unit = self.store.begin().await?;
        let rows = match unit
            .apply_balance_delta(top_up.account, top_up.amount, BalanceGuard::None)
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                discard(unit).await;
                return Err(err.into());
            }
        };
        if rows == 0 {
            warn!("top-up target does not exist");
            discard(unit).await;
            return Err(LedgerError::not_found(format!("account {}", top_up.account)));
        }
        Ok(unit)
    }
}

async fn discard(unit: Box<dyn LedgerUnit>) {
    if let Err(err) = unit.rollback().await {
        warn!(error = %err, "rollback failed");
    }
}

async fn apply_transfer(
    unit: &mut dyn LedgerUnit,
    transfer: &Transfer,
) -> Result<TransactionRecord, LedgerError> {
    unit.lock_accounts(&transfer.lock_order()).await?;

    let (sender, debit, guard) = transfer.debit();
    if unit.apply_balance_delta(sender, debit, guard).await? == 0 {
        warn!(sender = %sender, "debit refused");
        return Err(LedgerError::InsufficientFundsOrInvalidAccount);
    }

    let (receiver, credit, guard) = transfer.credit();
    if unit.apply_balance_delta(receiver, credit, guard).await? == 0 {
        warn!(receiver = %receiver, "credit target does not exist");
        return Err(LedgerError::InvalidAccount(receiver));
    }

    let record = TransactionRecord::transfer(sender, receiver, transfer.amount, Utc::now())?;
    unit.insert_transaction(&record).await?;
    Ok(record)
}
