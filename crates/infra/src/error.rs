//! Error taxonomy surfaced by the ledger services.

use std::time::Duration;

use thiserror::Error;

use ledgerbank_auth::AuthError;
use ledgerbank_core::{AccountNumber, DomainError};

use crate::store::StoreError;

/// Every failure a caller of the engine, query service or account service
/// can observe. Nothing is swallowed: atomic units are rolled back and the
/// error is returned unchanged.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or missing input, non-positive amount, or a balance that
    /// would exceed the storable maximum.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Duplicate email, or delete of an account still referenced by history.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unknown account or transaction.
    #[error("not found: {0}")]
    NotFound(String),

    /// The guarded debit affected no row: the sender is missing or short of funds.
    #[error("insufficient funds or invalid account number")]
    InsufficientFundsOrInvalidAccount,

    /// The credit affected no row: the receiver does not exist.
    #[error("invalid receiving account {0}")]
    InvalidAccount(AccountNumber),

    /// Bad credentials, invalid or expired token, or account mismatch.
    #[error("unauthorized: {0}")]
    Authorization(String),

    /// Persistence failure (connectivity, constraint, driver).
    #[error("storage error: {0}")]
    Storage(String),

    /// The atomic unit did not finish in time and was rolled back.
    #[error("atomic unit timed out after {0:?}")]
    Timeout(Duration),

    /// Failure in supporting machinery (hashing, signing, task join).
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }
}

impl From<DomainError> for LedgerError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => Self::Conflict(msg),
            StoreError::Referenced(msg) => Self::Conflict(msg),
            StoreError::OutOfRange(msg) => Self::Validation(msg),
            StoreError::Backend(msg) => Self::Storage(msg),
        }
    }
}

impl From<AuthError> for LedgerError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) | AuthError::Claims(_) => Self::Authorization(err.to_string()),
            AuthError::Signing(_) | AuthError::Hashing(_) => Self::Internal(err.to_string()),
        }
    }
}
