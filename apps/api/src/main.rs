mod config;
mod errors;
mod interview;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::orchestrator::InterviewOrchestrator;
use crate::interview::transcript::InMemoryTranscriptStore;
use crate::llm_client::{CompletionProxy, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize completion client
    let llm_config = config.llm_config();
    if !llm_config.has_credential() {
        warn!("GROQ_API_KEY is not set; interviewer turns will fail until it is configured");
    }
    let client = LlmClient::new(llm_config)?;
    info!("LLM client initialized (model: {})", client.model());
    let llm: Arc<dyn CompletionProxy> = Arc::new(client);

    // Sessions live in memory for the lifetime of the process
    let orchestrator = Arc::new(InterviewOrchestrator::new(
        llm.clone(),
        Box::new(InMemoryTranscriptStore::new()),
        config.question_limit,
    ));
    info!("Interview orchestrator ready ({} questions per interview)", config.question_limit);

    // Build app state
    let state = AppState {
        llm,
        orchestrator,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
