use chrono::{DateTime, Utc};
use serde::Serialize;

use ledgerbank_core::{AccountId, AccountNumber, DomainError, DomainResult};

use crate::money::Money;

/// A monetary account as owned by the account store.
///
/// # Invariants
/// - `balance` is never negative.
/// - `account_number` is assigned by the store at creation and never changes.
/// - `password_hash` is opaque and never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub account_number: AccountNumber,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

/// Column widths of the `accounts` table, in characters.
pub const MAX_NAME_LEN: usize = 50;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PASSWORD_HASH_LEN: usize = 200;

/// Validated input for account creation (before the store assigns identity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    /// All four fields are required, non-empty and within their column width.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> DomainResult<Self> {
        let first_name = required("first name", first_name.into(), MAX_NAME_LEN)?;
        let last_name = required("last name", last_name.into(), MAX_NAME_LEN)?;
        let email = required("email", email.into(), MAX_EMAIL_LEN)?;
        let password_hash = required("password", password_hash.into(), MAX_PASSWORD_HASH_LEN)?;

        Ok(Self {
            first_name,
            last_name,
            email,
            password_hash,
            created_at: Utc::now(),
        })
    }

    /// Materialize the account once the store has assigned its identity.
    ///
    /// New accounts always open with a zero balance.
    pub fn into_account(self, id: AccountId, account_number: AccountNumber) -> Account {
        Account {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            account_number,
            email: self.email,
            password_hash: self.password_hash,
            balance: Money::ZERO,
            created_at: self.created_at,
        }
    }
}

fn required(field: &str, value: String, max_len: usize) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_len {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}
