use axum::{
    Router,
    routing::{get, post},
};

pub mod accounts;
pub mod system;
pub mod transactions;
pub mod transfers;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route(
            "/account",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route("/login", post(accounts::login))
        .route("/transfer", post(transfers::transfer))
        .route("/topup", post(transfers::top_up))
        .route("/transactions", get(transactions::list_all))
        .route("/transactions/:account_number", get(transactions::for_account))
        .route("/transaction/:id", get(transactions::get_by_id))
}

/// Endpoints that require a bearer token matching the target account.
pub fn protected_router() -> Router {
    Router::new()
        .route(
            "/account/:id",
            get(accounts::get_account).delete(accounts::delete_account),
        )
        .route(
            "/account/number/:account_number",
            get(accounts::get_account_by_number),
        )
}
