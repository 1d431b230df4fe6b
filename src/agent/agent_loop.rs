//! Core agent loop implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::llm::{ChatMessage, LlmClient, LlmError, Role, ToolCall, ToolSchema};
use crate::mcp::{McpError, ToolServer};

use super::prompt::{build_system_prompt, git_instructions, GIT_AGENT_NAME};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("{0}")]
    Tool(#[from] McpError),

    #[error("LLM returned empty response")]
    EmptyResponse,

    #[error("Max turns ({0}) exceeded without a final answer")]
    MaxTurnsExceeded(usize),
}

/// A named, instruction-configured agent with access to tool servers.
pub struct Agent {
    name: String,
    instructions: String,
    model: String,
    max_turns: usize,
    llm: Arc<dyn LlmClient>,
    servers: Vec<Arc<dyn ToolServer>>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            max_turns: 10,
            llm,
            servers: Vec::new(),
        }
    }

    /// The git agent for the configured repository.
    pub fn git(config: &Config, llm: Arc<dyn LlmClient>, server: Arc<dyn ToolServer>) -> Self {
        Self::new(
            GIT_AGENT_NAME,
            git_instructions(&config.repo_path),
            config.model.clone(),
            llm,
        )
        .with_max_turns(config.max_turns)
        .with_tool_server(server)
    }

    pub fn with_tool_server(mut self, server: Arc<dyn ToolServer>) -> Self {
        self.servers.push(server);
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the agent on one input and return its final answer.
    pub async fn run(&self, input: &str) -> Result<String, AgentError> {
        let mut messages = vec![
            ChatMessage::system(build_system_prompt(&self.name, &self.instructions)),
            ChatMessage::user(input),
        ];

        let (tool_schemas, routes) = self.collect_tools().await?;

        for turn in 0..self.max_turns {
            debug!(agent = %self.name, "Agent turn {}", turn + 1);

            let response = self
                .llm
                .chat_completion(&self.model, &messages, Some(tool_schemas.as_slice()))
                .await?;

            if let Some(tool_calls) = response.tool_calls.filter(|calls| !calls.is_empty()) {
                messages.push(ChatMessage {
                    role: Role::Assistant,
                    content: response.content,
                    tool_calls: Some(tool_calls.clone()),
                    tool_call_id: None,
                });

                for tool_call in &tool_calls {
                    info!(
                        agent = %self.name,
                        "Calling tool: {} with args: {}",
                        tool_call.function.name,
                        tool_call.function.arguments
                    );
                    let result = self.execute_tool_call(tool_call, &routes).await?;
                    debug!(agent = %self.name, "Tool result: {}", truncate_for_log(&result, 1000));
                    messages.push(ChatMessage::tool_result(tool_call.id.clone(), result));
                }

                continue;
            }

            // No tool calls - this is the final answer
            return match response.content {
                Some(content) if !content.trim().is_empty() => Ok(content),
                _ => Err(AgentError::EmptyResponse),
            };
        }

        Err(AgentError::MaxTurnsExceeded(self.max_turns))
    }

    /// List tools from every server and map each tool name to its server.
    async fn collect_tools(
        &self,
    ) -> Result<(Vec<ToolSchema>, HashMap<String, Arc<dyn ToolServer>>), AgentError> {
        let mut schemas = Vec::new();
        let mut routes: HashMap<String, Arc<dyn ToolServer>> = HashMap::new();

        for server in &self.servers {
            for tool in server.list_tools().await? {
                if routes.contains_key(&tool.name) {
                    warn!(
                        server = server.name(),
                        "Duplicate tool name '{}', keeping the first", tool.name
                    );
                    continue;
                }
                routes.insert(tool.name.clone(), Arc::clone(server));
                schemas.push(ToolSchema::function(
                    tool.name,
                    tool.description,
                    tool.input_schema,
                ));
            }
        }

        Ok((schemas, routes))
    }

    /// Execute a single tool call, returning the text fed back to the model.
    ///
    /// Mistakes the model can correct (unknown tool, bad arguments, a tool
    /// reporting failure) come back as text; transport failures are errors.
    async fn execute_tool_call(
        &self,
        tool_call: &ToolCall,
        routes: &HashMap<String, Arc<dyn ToolServer>>,
    ) -> Result<String, AgentError> {
        let name = &tool_call.function.name;
        let Some(server) = routes.get(name) else {
            return Ok(format!("Error: unknown tool '{}'", name));
        };

        let raw = tool_call.function.arguments.trim();
        let parsed = if raw.is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(raw) {
                Ok(args) => args,
                Err(e) => return Ok(format!("Error: invalid JSON arguments: {}", e)),
            }
        };
        let args = match parsed {
            Value::Object(map) => Value::Object(map),
            Value::Null => Value::Object(Default::default()),
            other => {
                return Ok(format!(
                    "Error: arguments must be a JSON object, got {}",
                    other
                ))
            }
        };

        let output = server.call_tool(name, args).await?;
        if output.is_error {
            Ok(format!("Error: {}", output.text))
        } else {
            Ok(output.text)
        }
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}
