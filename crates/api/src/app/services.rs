//! Service wiring: picks the document gateway and builds the engine.

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use stockroom_infra::{CollectionGateway, InMemoryCollectionGateway, PostgresCollectionGateway};
use stockroom_reconcile::{EngineConfig, ReconciliationEngine};

use crate::config::ApiConfig;

/// Gateway type shared by every handler.
pub type SharedGateway = Arc<dyn CollectionGateway>;

pub struct AppServices {
    pub engine: ReconciliationEngine<SharedGateway>,
}

impl AppServices {
    pub fn new(gateway: SharedGateway, config: EngineConfig) -> Self {
        Self {
            engine: ReconciliationEngine::with_config(gateway, config),
        }
    }
}

/// Connect to Postgres when `DATABASE_URL` is configured, otherwise fall back
/// to an empty in-memory catalog.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let gateway: SharedGateway = match &config.database_url {
        Some(url) => {
            let pool = PgPool::connect(url)
                .await
                .context("failed to connect to Postgres")?;
            let gateway = PostgresCollectionGateway::new(pool);
            gateway
                .ensure_schema()
                .await
                .context("failed to prepare the documents table")?;
            tracing::info!("using Postgres document store");
            Arc::new(gateway)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory catalog (nothing is persisted)");
            Arc::new(InMemoryCollectionGateway::new())
        }
    };

    Ok(AppServices::new(gateway, config.engine))
}
