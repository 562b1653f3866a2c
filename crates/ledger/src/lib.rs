//! Ledger domain (accounts, money, transfers, transaction views).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod account;
pub mod balance;
pub mod money;
pub mod transaction;
pub mod transfer;

pub use account::{Account, NewAccount};
pub use balance::{BalanceGuard, DeltaOutcome, apply_delta};
pub use money::{MONEY_SCALE, Money};
pub use transaction::{
    PartySnapshot, TRANSFER_DESCRIPTION, TRANSFER_STATUS, TransactionFilter, TransactionRecord,
    TransactionView,
};
pub use transfer::{TopUp, Transfer};
