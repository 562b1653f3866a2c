//! Service wiring: store selection and the ledger services built on it.

use std::sync::Arc;
use std::time::Duration;

use ledgerbank_auth::{Hs256TokenIssuer, TokenIssuer};
use ledgerbank_infra::{
    AccountService, InMemoryLedgerStore, LedgerConfig, LedgerStore, PostgresLedgerStore,
    StoreError, TransactionQueryService, TransferEngine,
};

const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct AppServices {
    pub accounts: AccountService,
    pub engine: TransferEngine,
    pub queries: TransactionQueryService,
}

impl AppServices {
    pub fn new(store: Arc<dyn LedgerStore>, config: &LedgerConfig) -> Self {
        let ttl = chrono::Duration::from_std(config.token_ttl).unwrap_or_else(|_| {
            tracing::warn!(ttl = ?config.token_ttl, "token ttl out of range; using 15 minutes");
            chrono::Duration::minutes(15)
        });
        let issuer: Arc<dyn TokenIssuer> = Arc::new(Hs256TokenIssuer::new(
            config.jwt_secret.clone().into_bytes(),
            ttl,
        ));

        Self {
            accounts: AccountService::new(store.clone(), issuer),
            engine: TransferEngine::new(store.clone(), config.unit_timeout),
            queries: TransactionQueryService::new(store),
        }
    }
}

/// Postgres when the config names a database, in-memory otherwise.
pub async fn build_services(config: &LedgerConfig) -> Result<AppServices, StoreError> {
    let store: Arc<dyn LedgerStore> = match &config.database {
        Some(db) => {
            let store =
                PostgresLedgerStore::connect(&db.url, db.max_connections, DB_ACQUIRE_TIMEOUT)
                    .await?;
            store.ensure_schema().await?;
            tracing::info!(max_connections = db.max_connections, "using postgres store");
            Arc::new(store)
        }
        None => {
            tracing::info!("using in-memory store");
            Arc::new(InMemoryLedgerStore::new())
        }
    };

    Ok(AppServices::new(store, config))
}
