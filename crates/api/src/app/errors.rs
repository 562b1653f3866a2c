use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use ledgerbank_core::DomainError;
use ledgerbank_infra::LedgerError;

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        LedgerError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        LedgerError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        e @ LedgerError::InsufficientFundsOrInvalidAccount => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "insufficient_funds",
            e.to_string(),
        ),
        e @ LedgerError::InvalidAccount(_) => {
            json_error(StatusCode::NOT_FOUND, "invalid_account", e.to_string())
        }
        LedgerError::Authorization(msg) => json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg),
        LedgerError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "storage unavailable",
            )
        }
        e @ LedgerError::Timeout(_) => {
            json_error(StatusCode::GATEWAY_TIMEOUT, "timeout", e.to_string())
        }
        LedgerError::Internal(msg) => {
            tracing::error!(error = %msg, "internal failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            )
        }
    }
}

/// Path and body parsing failures.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    ledger_error_to_response(err.into())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
