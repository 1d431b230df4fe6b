//! git-agent - HTTP Server Entry Point
//!
//! Loads configuration, wires the agent to the git MCP server and serves the API.

use std::sync::Arc;

use git_agent::{
    agent::Agent,
    api::{self, AppState},
    config::Config,
    llm::OpenAiClient,
    mcp::{inherited_env, McpConnection, McpServerParams},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "git_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // A missing .env is fine; the variables may come from the real environment
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {}", path.display());
    }

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, repo={}",
        config.model,
        config.repo_path.display()
    );

    let connection = Arc::new(McpConnection::new(McpServerParams::git(
        &config,
        inherited_env(),
    )));
    let llm = Arc::new(OpenAiClient::new(config.api_key.clone(), config.base_url.clone()));
    let agent = Agent::git(&config, llm, connection.clone());
    let state = Arc::new(AppState::new(Arc::new(agent)));

    api::serve(&config, state, connection).await
}
