use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn transfer(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::TransferRequest>,
) -> axum::response::Response {
    match services
        .engine
        .transfer(body.from_account, body.to_account, &body.amount)
        .await
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn top_up(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::TopUpRequest>,
) -> axum::response::Response {
    match services.engine.top_up(body.account, &body.amount).await {
        Ok(receipt) => (StatusCode::OK, Json(dto::TopUpResponse::from(receipt))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
