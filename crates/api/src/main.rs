use anyhow::{Context, Result};
use api::{AppConfig, AppState, logging};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    logging::init(config.log.json);

    if config.llm.api_key.is_empty() {
        tracing::warn!("HF_TOKEN is not set; evaluations will fail until a credential is provided");
    }

    let state = Arc::new(AppState::from_config(&config)?);

    tracing::info!(
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        config_dir = %config.storage.config_dir.display(),
        require_rubric = config.evaluation.require_rubric,
        "Grader configured"
    );

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    tracing::info!("Server listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
