use anyhow::Context;

use facturas_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    facturas_observability::init();

    let config = ApiConfig::from_env()?;
    let store = facturas_api::app::services::build_store(&config).await?;
    let app = facturas_api::app::build_app(store);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
