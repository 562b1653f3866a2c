//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and ledger services
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses
//! - `extract.rs`: request extractors with JSON rejections

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use ledgerbank_infra::{LedgerConfig, StoreError};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &LedgerConfig) -> Result<Router, StoreError> {
    let services = services::build_services(config).await?;
    Ok(router(config, Arc::new(services)))
}

/// Router over already-built services.
pub fn router(config: &LedgerConfig, services: Arc<services::AppServices>) -> Router {
    let jwt = Arc::new(ledgerbank_auth::Hs256JwtValidator::new(
        config.jwt_secret.clone().into_bytes(),
    ));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: the bearer token must belong to the target account.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
