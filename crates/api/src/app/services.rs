//! Store wiring: in-memory (dev/test) or Postgres (feature `postgres`).

use std::sync::Arc;

use facturas_infra::InMemoryFacturaStore;

use crate::app::SharedStore;
use crate::config::{ApiConfig, StoreBackend};

/// Build the configured store, registering the configured billers.
pub async fn build_store(config: &ApiConfig) -> anyhow::Result<SharedStore> {
    match &config.store {
        StoreBackend::Memory => {
            tracing::info!(
                facturadores = config.facturadores.len(),
                "using in-memory invoice store"
            );
            Ok(Arc::new(InMemoryFacturaStore::with_facturadores(
                config.facturadores.iter().cloned(),
            )))
        }
        StoreBackend::Postgres { database_url } => build_postgres_store(config, database_url).await,
    }
}

#[cfg(feature = "postgres")]
async fn build_postgres_store(config: &ApiConfig, database_url: &str) -> anyhow::Result<SharedStore> {
    let store = facturas_infra::PostgresFacturaStore::connect(database_url).await?;
    store.migrate().await?;
    for facturador in &config.facturadores {
        store.register_facturador(facturador).await?;
    }
    tracing::info!("using postgres invoice store");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn build_postgres_store(_config: &ApiConfig, _database_url: &str) -> anyhow::Result<SharedStore> {
    anyhow::bail!("FACTURAS_STORE=postgres requires building with the `postgres` feature")
}
