use anyhow::{bail, Context};
use tracing::info;

use crate::config::{AppConfig, StoreBackend};
use crate::store::PgDocumentStore;

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    if config.database.backend != StoreBackend::Postgres {
        bail!("migrate needs STORE_BACKEND=postgres and DATABASE_URL");
    }

    let store = PgDocumentStore::connect(&config.database)
        .await
        .context("failed to connect to Postgres")?;
    store.migrate().await.context("migration failed")?;

    info!("Documents table and indexes are up to date");
    Ok(())
}
