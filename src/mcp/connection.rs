//! Stdio connection to a single MCP server subprocess.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use rmcp::model::CallToolRequestParam;
use rmcp::service::{Peer, RoleClient, RunningService};
use rmcp::transport::TokioChildProcess;
use rmcp::ServiceExt;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{McpError, ToolDefinition, ToolOutput, ToolServer};
use crate::config::Config;

/// Copy of this process's environment, including entries that are not UTF-8.
pub fn inherited_env() -> HashMap<OsString, OsString> {
    std::env::vars_os().collect()
}

/// Launch parameters for an MCP server subprocess.
#[derive(Debug, Clone)]
pub struct McpServerParams {
    /// Human-readable server name, used in logs and errors
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    /// Working directory of the subprocess
    pub cwd: PathBuf,
    /// Full environment of the subprocess
    pub env: HashMap<OsString, OsString>,
    /// Log tool output received over the stdout channel
    pub log_stdout: bool,
    /// Forward stderr lines to the log
    pub log_stderr: bool,
}

impl McpServerParams {
    /// Parameters for the git server: runs in the repository with the given environment.
    pub fn git(config: &Config, env: HashMap<OsString, OsString>) -> Self {
        Self {
            name: "git-mcp".to_string(),
            command: config.mcp.command.clone(),
            args: config.mcp.args.clone(),
            cwd: config.repo_path.clone(),
            env,
            log_stdout: config.mcp.log_stdout,
            log_stderr: config.mcp.log_stderr,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .env_clear()
            .envs(&self.env)
            .kill_on_drop(true);
        cmd
    }
}

/// One MCP server process and its client session.
///
/// Constructed disconnected; `connect` spawns the process and performs the
/// handshake, `cleanup` tears it down. Tool calls share the session's peer
/// handle, so the lock is only held to clone it.
pub struct McpConnection {
    params: McpServerParams,
    session: RwLock<Option<RunningService<RoleClient, ()>>>,
}

impl McpConnection {
    pub fn new(params: McpServerParams) -> Self {
        Self {
            params,
            session: RwLock::new(None),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Start the subprocess and run the MCP handshake.
    ///
    /// Calling this while already connected logs a warning and does nothing.
    pub async fn connect(&self) -> Result<(), McpError> {
        let mut session = self.session.write().await;
        if session.is_some() {
            warn!(server = %self.params.name, "MCP server already connected");
            return Ok(());
        }

        info!(
            server = %self.params.name,
            command = %self.params.command,
            args = ?self.params.args,
            cwd = %self.params.cwd.display(),
            "Starting MCP server"
        );

        let stderr = if self.params.log_stderr {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let (transport, child_stderr) = TokioChildProcess::builder(self.params.command())
            .stderr(stderr)
            .spawn()
            .map_err(|e| McpError::Spawn {
                name: self.params.name.clone(),
                message: e.to_string(),
            })?;

        if let Some(child_stderr) = child_stderr {
            forward_stderr(self.params.name.clone(), child_stderr);
        }

        let service = ().serve(transport).await.map_err(|e| McpError::Handshake {
            name: self.params.name.clone(),
            message: e.to_string(),
        })?;

        if let Some(server) = service.peer_info() {
            info!(
                server = %self.params.name,
                implementation = %server.server_info.name,
                version = %server.server_info.version,
                "MCP server connected"
            );
        }

        *session = Some(service);
        Ok(())
    }

    /// Shut down the session and the subprocess.
    ///
    /// Safe to call when never connected, after a failed connect, or twice.
    pub async fn cleanup(&self) {
        let Some(service) = self.session.write().await.take() else {
            debug!(server = %self.params.name, "MCP server not running, nothing to clean up");
            return;
        };

        match service.cancel().await {
            Ok(reason) => info!(server = %self.params.name, ?reason, "MCP server stopped"),
            Err(e) => warn!(server = %self.params.name, "Failed to stop MCP server: {}", e),
        }
    }

    async fn peer(&self) -> Result<Peer<RoleClient>, McpError> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|service| service.peer().clone())
            .ok_or_else(|| McpError::NotConnected(self.params.name.clone()))
    }

    fn request_error(&self, e: impl std::fmt::Display) -> McpError {
        McpError::Request {
            name: self.params.name.clone(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl ToolServer for McpConnection {
    fn name(&self) -> &str {
        &self.params.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, McpError> {
        let tools = self
            .peer()
            .await?
            .list_all_tools()
            .await
            .map_err(|e| self.request_error(e))?;

        let definitions = tools
            .iter()
            .filter_map(|tool| serde_json::to_value(tool).ok())
            .filter_map(|value| tool_definition(&value))
            .collect::<Vec<_>>();
        debug!(server = %self.params.name, count = definitions.len(), "Listed MCP tools");
        Ok(definitions)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput, McpError> {
        let peer = self.peer().await?;

        let arguments = match arguments {
            Value::Object(map) => Value::Object(map),
            Value::Null => json!({}),
            other => {
                return Err(self.request_error(format!(
                    "arguments must be an object, got {}",
                    other
                )))
            }
        };
        let request: CallToolRequestParam =
            serde_json::from_value(json!({ "name": name, "arguments": arguments }))
                .map_err(|e| self.request_error(e))?;

        let result = peer
            .call_tool(request)
            .await
            .map_err(|e| self.request_error(e))?;
        let result = serde_json::to_value(&result).map_err(|e| self.request_error(e))?;
        let output = render_tool_result(&result);

        if self.params.log_stdout {
            debug!(
                server = %self.params.name,
                tool = name,
                is_error = output.is_error,
                "{}",
                output.text
            );
        }
        Ok(output)
    }
}

fn forward_stderr(server: String, stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => info!(server = %server, "[stderr] {}", line),
                Ok(None) => break,
                Err(e) => {
                    warn!(server = %server, "Failed to read MCP server stderr: {}", e);
                    break;
                }
            }
        }
    });
}

/// Extract a tool definition from the MCP wire form of a tool.
fn tool_definition(tool: &Value) -> Option<ToolDefinition> {
    let name = tool.get("name")?.as_str()?.to_string();
    let description = tool
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let input_schema = tool
        .get("inputSchema")
        .cloned()
        .unwrap_or_else(|| json!({ "type": "object", "properties": {} }));
    Some(ToolDefinition {
        name,
        description,
        input_schema,
    })
}

/// Render the MCP wire form of a tool result as text.
///
/// Text blocks are joined with newlines; other content types become a
/// placeholder. Falls back to structured content when there is no text.
fn render_tool_result(result: &Value) -> ToolOutput {
    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let parts: Vec<String> = result
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .map(|block| match block.get("type").and_then(Value::as_str) {
                    Some("text") => block
                        .get("text")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    Some(other) => format!("[{}]", other),
                    None => block.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let text = if parts.is_empty() {
        result
            .get("structuredContent")
            .map(Value::to_string)
            .unwrap_or_default()
    } else {
        parts.join("\n")
    };

    ToolOutput { text, is_error }
}
