pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pages;
pub mod routes;

pub use config::AppConfig;
pub use error::AppError;
pub use metrics::Metrics;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::get,
};
use evaluate::{BundleStore, ChatClient, Evaluator, FsBundleStore, GenerationParams, RetryPolicy};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub store: Arc<dyn BundleStore>,
    pub evaluator: Evaluator,
    pub metrics: Arc<Metrics>,
    pub require_rubric: bool,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = ChatClient::new(
            config.llm.base_url.clone(),
            config.llm.model.clone(),
            config.llm.api_key.clone(),
            GenerationParams {
                max_tokens: config.llm.max_tokens,
                temperature: config.llm.temperature,
                top_p: config.llm.top_p,
            },
            config.llm.request_timeout(),
        )
        .context("Failed to build HTTP client for the text-generation service")?;

        let retry = RetryPolicy::new(
            config.retry.max_retries,
            config.retry.initial_backoff_ms,
            config.retry.max_backoff_ms,
        );

        Ok(Self {
            store: Arc::new(FsBundleStore::new(config.storage.config_dir.clone())),
            evaluator: Evaluator::new(client, retry),
            metrics: Metrics::new(),
            require_rubric: config.evaluation.require_rubric,
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/", get(routes::index).post(routes::submit))
        .route("/config", get(routes::config_form).post(routes::save_config))
        .route("/health", get(routes::health))
        .route("/stats", get(routes::stats))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}
