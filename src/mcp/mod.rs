//! MCP tool servers.
//!
//! The agent talks to tools through the `ToolServer` trait. The production
//! implementation is `McpConnection`, which owns one MCP server subprocess
//! reached over the stdio transport.

mod connection;

pub use connection::{inherited_env, McpConnection, McpServerParams};

/// Stdio MCP server script used by connection and server tests.
#[cfg(test)]
pub(crate) const FAKE_SERVER_SCRIPT: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/src/mcp/testdata/fake_mcp_server.sh");

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("MCP server '{0}' is not connected")]
    NotConnected(String),

    #[error("failed to start MCP server '{name}': {message}")]
    Spawn { name: String, message: String },

    #[error("MCP handshake with '{name}' failed: {message}")]
    Handshake { name: String, message: String },

    #[error("MCP request to '{name}' failed: {message}")]
    Request { name: String, message: String },
}

/// A tool advertised by a server.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool's arguments
    pub input_schema: Value,
}

/// Rendered result of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    /// The server reported the call as failed
    pub is_error: bool,
}

/// A provider of callable tools.
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Human-readable server name.
    fn name(&self) -> &str;

    /// List the tools this server exposes.
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, McpError>;

    /// Invoke a tool with JSON-object arguments.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput, McpError>;
}
