use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use ledgerbank_core::{AccountId, AccountNumber};

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::CreateAccountRequest>,
) -> axum::response::Response {
    match services.accounts.register(body.into()).await {
        Ok(opened) => (StatusCode::OK, Json(dto::AccountWithToken::from(opened))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_accounts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.accounts.list_accounts().await {
        Ok(accounts) => (StatusCode::OK, Json(accounts)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::LoginRequest>,
) -> axum::response::Response {
    match services.accounts.login(&body.email, &body.password).await {
        Ok(auth) => (StatusCode::OK, Json(dto::AccountWithToken::from(auth))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match id.parse::<AccountId>() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match crate::authz::authorize_account(&services, &caller, id).await {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_account_by_number(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(number): Path<String>,
) -> axum::response::Response {
    let number = match number.parse::<AccountNumber>() {
        Ok(number) => number,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match crate::authz::authorize_account_number(&services, &caller, number).await {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn delete_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match id.parse::<AccountId>() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(resp) = crate::authz::authorize_account(&services, &caller, id).await {
        return resp;
    }

    match services.accounts.delete_account(id).await {
        Ok(()) => (StatusCode::OK, Json(dto::DeletedResponse { deleted: id })).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
