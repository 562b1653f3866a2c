use anyhow::Context;

use ledgerbank_infra::LedgerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ledgerbank_observability::init();

    let config = LedgerConfig::from_env().context("invalid configuration")?;

    let app = ledgerbank_api::app::build_app(&config)
        .await
        .context("failed to initialize the account store")?;

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
