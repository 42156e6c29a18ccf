mod analysis;
mod config;
mod db;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod resume;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::resume::live::ResumeFeed;
use crate::resume::store::{MemoryResumeStore, PgResumeStore, ResumeStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResumeForge API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the document store
    let store: Arc<dyn ResumeStore> = match &config.database_url {
        Some(url) => Arc::new(PgResumeStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; resumes are kept in memory and lost on restart");
            Arc::new(MemoryResumeStore::new())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_max_attempts)?;
    info!(
        "LLM client initialized (model: {}, attempts: {})",
        llm_client::MODEL,
        config.llm_max_attempts
    );

    let feed = ResumeFeed::new(config.feed_capacity);

    // Build app state
    let state = AppState {
        store,
        llm,
        feed,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
