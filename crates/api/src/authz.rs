//! Per-account access check for protected account routes.

use axum::http::StatusCode;
use tracing::warn;

use ledgerbank_core::{AccountId, AccountNumber};
use ledgerbank_ledger::Account;

use crate::app::errors::{json_error, ledger_error_to_response};
use crate::app::services::AppServices;
use crate::context::CallerContext;

/// Load account `id` if and only if it belongs to the caller.
pub async fn authorize_account(
    services: &AppServices,
    caller: &CallerContext,
    id: AccountId,
) -> Result<Account, axum::response::Response> {
    services
        .accounts
        .authorize(caller.claims(), id)
        .await
        .map_err(ledger_error_to_response)
}

/// Load account `number` if the token was issued for it. The number is
/// compared before the lookup, so a foreign number never reveals whether the
/// account exists.
pub async fn authorize_account_number(
    services: &AppServices,
    caller: &CallerContext,
    number: AccountNumber,
) -> Result<Account, axum::response::Response> {
    if caller.account_number() != number {
        warn!(requested = %number, claimed = %caller.account_number(), "permission denied");
        return Err(json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "permission denied",
        ));
    }

    services
        .accounts
        .get_account_by_number(number)
        .await
        .map_err(ledger_error_to_response)
}
