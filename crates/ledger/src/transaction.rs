use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerbank_core::{AccountNumber, DomainError, DomainResult, TransactionId};

use crate::account::Account;
use crate::money::Money;

/// Status recorded for every bank transfer.
pub const TRANSFER_STATUS: &str = "Credit";

/// Description recorded for every bank transfer.
pub const TRANSFER_DESCRIPTION: &str = "Bank Transfer";

/// An immutable transaction fact as stored in the ledger.
///
/// Sender and receiver are references (account numbers), never copies of
/// account state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub sender: AccountNumber,
    pub receiver: AccountNumber,
    pub amount: Money,
    pub status: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl TransactionRecord {
    /// Record for a bank transfer between two accounts.
    pub fn transfer(
        sender: AccountNumber,
        receiver: AccountNumber,
        amount: Money,
        date: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::validation("transaction amount must be positive"));
        }
        Ok(Self {
            id: TransactionId::new(),
            sender,
            receiver,
            amount,
            status: TRANSFER_STATUS.to_string(),
            description: TRANSFER_DESCRIPTION.to_string(),
            date,
        })
    }

    pub fn involves(&self, account: AccountNumber) -> bool {
        self.sender == account || self.receiver == account
    }
}

/// Current state of one side of a transaction, taken at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySnapshot {
    pub account_number: AccountNumber,
    pub first_name: String,
    pub last_name: String,
    pub balance: Money,
    pub email: String,
}

impl From<&Account> for PartySnapshot {
    fn from(account: &Account) -> Self {
        Self {
            account_number: account.account_number,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            balance: account.balance,
            email: account.email.clone(),
        }
    }
}

/// A transaction joined with the *current* sender and receiver rows.
///
/// Balances and names reflect the accounts when the view was read, not when
/// the transfer happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: TransactionId,
    pub sender_account: PartySnapshot,
    pub receiver_account: PartySnapshot,
    pub amount: Money,
    pub status: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl TransactionView {
    pub fn join(record: &TransactionRecord, sender: &Account, receiver: &Account) -> Self {
        Self {
            id: record.id,
            sender_account: sender.into(),
            receiver_account: receiver.into(),
            amount: record.amount,
            status: record.status.clone(),
            description: record.description.clone(),
            date: record.date,
        }
    }
}

/// Which transactions a query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionFilter {
    All,
    /// Transactions where the account is sender OR receiver.
    Account(AccountNumber),
}

impl TransactionFilter {
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Account(n) => record.involves(*n),
        }
    }
}
