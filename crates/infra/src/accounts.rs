//! Account lifecycle and the credential side of the access gate.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use ledgerbank_auth::{AccountClaims, TokenIssuer, hash_password, verify_password};
use ledgerbank_core::{AccountId, AccountNumber};
use ledgerbank_ledger::{Account, NewAccount};

use crate::error::LedgerError;
use crate::store::LedgerStore;

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Input for opening an account. The password is plaintext here and never
/// leaves this service unhashed.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// An account together with a freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account: Account,
    pub token: String,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn LedgerStore>,
    issuer: Arc<dyn TokenIssuer>,
}

impl AccountService {
    pub fn new(store: Arc<dyn LedgerStore>, issuer: Arc<dyn TokenIssuer>) -> Self {
        Self { store, issuer }
    }

    #[instrument(skip(self, registration), fields(email = %registration.email), err)]
    pub async fn register(
        &self,
        registration: Registration,
    ) -> Result<AuthenticatedAccount, LedgerError> {
        if registration.password.is_empty() {
            return Err(LedgerError::Validation("password is required".to_string()));
        }

        let email = registration.email.trim().to_string();
        if self.store.get_account_by_email(&email).await?.is_some() {
            return Err(LedgerError::Conflict(format!("email {email} is already registered")));
        }

        let password = registration.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| LedgerError::Internal(format!("password hashing task failed: {e}")))??;

        let new_account = NewAccount::new(
            registration.first_name,
            registration.last_name,
            email,
            password_hash,
        )?;
        let account = self.store.create_account(new_account).await?;
        info!(account_number = %account.account_number, "account opened");

        let token = self.issue(&account)?;
        Ok(AuthenticatedAccount { account, token })
    }

    /// Every mismatch reports the same error, whether or not the email exists.
    #[instrument(skip(self, password), err)]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedAccount, LedgerError> {
        let Some(account) = self.store.get_account_by_email(email.trim()).await? else {
            warn!("login for unknown email");
            return Err(LedgerError::unauthorized(INVALID_CREDENTIALS));
        };

        let password = password.to_string();
        let stored = account.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| LedgerError::Internal(format!("password check task failed: {e}")))?;

        if !verified {
            warn!(account_number = %account.account_number, "login with wrong password");
            return Err(LedgerError::unauthorized(INVALID_CREDENTIALS));
        }

        let token = self.issue(&account)?;
        Ok(AuthenticatedAccount { account, token })
    }

    /// Load `id` on behalf of the token holder.
    ///
    /// Fails closed: a missing account and a foreign account are both
    /// `Authorization` errors.
    pub async fn authorize(
        &self,
        claims: &AccountClaims,
        id: AccountId,
    ) -> Result<Account, LedgerError> {
        match self.store.get_account_by_id(id).await? {
            Some(account) if account.account_number == claims.account_number => Ok(account),
            _ => {
                warn!(account_id = %id, claimed = %claims.account_number, "permission denied");
                Err(LedgerError::unauthorized("permission denied"))
            }
        }
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .get_account_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("account {id}")))
    }

    pub async fn get_account_by_number(
        &self,
        number: AccountNumber,
    ) -> Result<Account, LedgerError> {
        self.store
            .get_account_by_number(number)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("account number {number}")))
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.store.list_accounts().await?)
    }

    /// Accounts with recorded transactions cannot be deleted.
    #[instrument(skip(self), fields(account_id = %id), err)]
    pub async fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        if self.store.delete_account(id).await? == 0 {
            return Err(LedgerError::not_found(format!("account {id}")));
        }
        info!("account deleted");
        Ok(())
    }

    fn issue(&self, account: &Account) -> Result<String, LedgerError> {
        Ok(self.issuer.issue(account.account_number, Utc::now())?)
    }
}
