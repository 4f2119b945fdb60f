mod config;
mod errors;
mod llm_client;
mod models;
mod narrative;
mod report;
mod routes;
mod state;
mod tracker;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::narrative::{LlmNarrator, NarrativeGenerator};
use crate::routes::build_router;
use crate::state::AppState;
use crate::tracker::gitlab::GitLabClient;
use crate::tracker::IssueTracker;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cadence API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the tracker client
    let tracker: Arc<dyn IssueTracker> = Arc::new(GitLabClient::new(
        config.gitlab_url.clone(),
        config.gitlab_token.clone(),
        config.project_whitelist.clone(),
    ));
    info!("Tracker client initialized ({})", config.gitlab_url);

    // Initialize the narrative generator, if an API key is configured
    let narrator: Option<Arc<dyn NarrativeGenerator>> = match &config.anthropic_api_key {
        Some(key) => {
            info!("Narrative generator initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(LlmNarrator::new(LlmClient::new(key.clone()))))
        }
        None => {
            info!("No LLM API key configured; report summaries will carry the unavailable marker");
            None
        }
    };

    // Build app state
    let state = AppState {
        tracker,
        narrator,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
