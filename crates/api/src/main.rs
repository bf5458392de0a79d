use std::sync::Arc;

use anyhow::Context;

use cartaporte_api::app::{build_app, services};
use cartaporte_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cartaporte_observability::init();

    let config = ApiConfig::load()?;
    let services = Arc::new(services::build_services(&config).await?);
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, revision = %config.schema_revision, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
