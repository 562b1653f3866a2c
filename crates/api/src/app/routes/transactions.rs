use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use ledgerbank_core::{AccountNumber, TransactionId};

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn list_all(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.queries.list_all_transactions().await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn for_account(
    Extension(services): Extension<Arc<AppServices>>,
    Path(account_number): Path<String>,
) -> axum::response::Response {
    let account_number = match account_number.parse::<AccountNumber>() {
        Ok(n) => n,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .queries
        .get_transactions_for_account(account_number)
        .await
    {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_by_id(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match id.parse::<TransactionId>() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.queries.get_transaction_by_id(id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
