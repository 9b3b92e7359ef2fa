use std::sync::Arc;

use anyhow::Context;
use crosstalk::{app, gateway::HttpGateway, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crosstalk=debug,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let gateway = HttpGateway::new(&config.gateway_url, config.gateway_concurrency)
        .context("building translation client")?;
    tracing::info!(gateway = %config.gateway_url, timeout = ?config.gateway_timeout, "translation gateway configured");

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("binding {}:{}", config.host, config.port))?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    let state = AppState::new(config, Arc::new(gateway));
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
