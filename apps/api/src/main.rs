mod config;
mod errors;
mod llm_client;
mod routes;
mod state;
mod writing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{ChatCompletion, LlmClient};
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;
use crate::writing::scoring::{FixedScorer, LlmRubricScorer, OutputScorer};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Quill API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize completion client
    let llm: Arc<dyn ChatCompletion> = Arc::new(LlmClient::new(
        &config.openai_base_url,
        config.openai_api_key.clone(),
    )?);
    info!(
        "LLM client initialized (base: {}, default model: {})",
        config.openai_base_url, config.default_model
    );

    // Initialize scorer (LlmRubricScorer by default — ENABLE_SCORING=false swaps in FixedScorer)
    let scorer: Arc<dyn OutputScorer> = if config.enable_scoring {
        Arc::new(LlmRubricScorer::new(llm.clone(), config.scoring_model.clone()))
    } else {
        Arc::new(FixedScorer)
    };
    info!("Output scorer: {}", scorer.backend());

    let state = AppState {
        llm,
        scorer,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
