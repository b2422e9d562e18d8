use std::sync::Arc;

use anyhow::Context;

use stockroom_api::app::{build_app, services};
use stockroom_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env();
    stockroom_observability::init(config.log_format);
    for warning in config.warnings() {
        tracing::warn!("{warning}");
    }

    let services = Arc::new(services::build_services(&config).await?);
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
