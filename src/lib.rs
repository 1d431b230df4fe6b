//! # git-agent
//!
//! An HTTP service that answers questions about a git repository.
//!
//! This library provides:
//! - An HTTP API with a single query route
//! - A tool-based agent loop over an OpenAI-compatible chat API
//! - A stdio connection to the git MCP server (`mcp-server-git`)
//!
//! ## Architecture
//!
//! 1. Configuration is loaded from the environment
//! 2. The git MCP server is launched in the repository and connected
//! 3. Each `POST /chat` query runs the agent, which may call git tools
//! 4. On shutdown the MCP server is cleaned up
//!
//! ## Example
//!
//! ```rust,ignore
//! use git_agent::{agent::Agent, config::Config, llm::OpenAiClient, mcp::{inherited_env, McpConnection, McpServerParams}};
//!
//! let config = Config::from_env()?;
//! let connection = Arc::new(McpConnection::new(McpServerParams::git(&config, inherited_env())));
//! let llm = Arc::new(OpenAiClient::new(config.api_key.clone(), config.base_url.clone()));
//! let agent = Agent::git(&config, llm, connection.clone());
//! connection.connect().await?;
//! let answer = agent.run("show me the last 3 commits").await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod mcp;

pub use config::Config;
