//! Request/response bodies.
//!
//! Field names are camelCase; the lower-case names used by older clients
//! (`firstname`, `lastname`, `acc_number`) are accepted as aliases.

use serde::{Deserialize, Serialize};

use ledgerbank_core::{AccountId, AccountNumber};
use ledgerbank_infra::{AuthenticatedAccount, Registration, TopUpReceipt};
use ledgerbank_ledger::{Account, Money};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[serde(default, alias = "firstname")]
    pub first_name: String,
    #[serde(default, alias = "lastname")]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl From<CreateAccountRequest> for Registration {
    fn from(body: CreateAccountRequest) -> Self {
        Registration {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            password: body.password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_account: AccountNumber,
    pub to_account: AccountNumber,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    #[serde(alias = "acc_number")]
    pub account: AccountNumber,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct AccountWithToken {
    pub account: Account,
    pub token: String,
}

impl From<AuthenticatedAccount> for AccountWithToken {
    fn from(auth: AuthenticatedAccount) -> Self {
        Self {
            account: auth.account,
            token: auth.token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: AccountId,
}

#[derive(Debug, Serialize)]
pub struct TopUpResponse {
    pub success: String,
    pub account: AccountNumber,
    pub amount: Money,
}

impl From<TopUpReceipt> for TopUpResponse {
    fn from(receipt: TopUpReceipt) -> Self {
        Self {
            success: format!("account({}) funded with ${}", receipt.account, receipt.amount),
            account: receipt.account,
            amount: receipt.amount,
        }
    }
}
