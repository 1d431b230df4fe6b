//! Scripted LLM and static tool server for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::{ChatMessage, ChatResponse, FunctionCall, LlmClient, LlmError, ToolCall, ToolSchema};
use crate::mcp::{McpError, ToolDefinition, ToolOutput, ToolServer};

pub(crate) fn reply(text: &str) -> ChatResponse {
    ChatResponse {
        content: Some(text.to_string()),
        tool_calls: None,
    }
}

pub(crate) fn tool_call(id: &str, name: &str, arguments: &str) -> ChatResponse {
    ChatResponse {
        content: None,
        tool_calls: Some(vec![ToolCall {
            id: id.to_string(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }]),
    }
}

/// Replays queued responses and records every request.
pub(crate) struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    tool_names: Mutex<Vec<Vec<String>>>,
}

impl ScriptedLlm {
    pub(crate) fn new(responses: Vec<Result<ChatResponse, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            tool_names: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn tool_names(&self) -> Vec<Vec<String>> {
        self.tool_names.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, LlmError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.tool_names.lock().unwrap().push(
            tools
                .unwrap_or_default()
                .iter()
                .map(|t| t.function.name.clone())
                .collect(),
        );
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".to_string())))
    }
}

/// Tool server with fixed tools and canned outputs.
pub(crate) struct StaticTools {
    tools: Vec<ToolDefinition>,
    outputs: HashMap<String, ToolOutput>,
    connected: bool,
    calls: Mutex<Vec<(String, Value)>>,
}

impl StaticTools {
    /// `git_log` and `git_status`, as the git MCP server exposes them.
    pub(crate) fn git() -> Self {
        let schema = json!({
            "type": "object",
            "properties": {"repo_path": {"type": "string"}},
            "required": ["repo_path"]
        });
        let tools = vec![
            ToolDefinition {
                name: "git_log".to_string(),
                description: "Shows the commit logs".to_string(),
                input_schema: schema.clone(),
            },
            ToolDefinition {
                name: "git_status".to_string(),
                description: "Shows the working tree status".to_string(),
                input_schema: schema,
            },
        ];
        let outputs = HashMap::from([
            (
                "git_log".to_string(),
                ToolOutput {
                    text: "abc123 Initial commit".to_string(),
                    is_error: false,
                },
            ),
            (
                "git_status".to_string(),
                ToolOutput {
                    text: "On branch main".to_string(),
                    is_error: false,
                },
            ),
        ]);
        Self {
            tools,
            outputs,
            connected: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::git()
        }
    }

    pub(crate) fn with_output(mut self, tool: &str, output: ToolOutput) -> Self {
        self.outputs.insert(tool.to_string(), output);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolServer for StaticTools {
    fn name(&self) -> &str {
        "static-git"
    }

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, McpError> {
        if !self.connected {
            return Err(McpError::NotConnected(self.name().to_string()));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput, McpError> {
        if !self.connected {
            return Err(McpError::NotConnected(self.name().to_string()));
        }
        self.calls.lock().unwrap().push((name.to_string(), arguments));
        self.outputs.get(name).cloned().ok_or_else(|| McpError::Request {
            name: self.name().to_string(),
            message: format!("no output for {}", name),
        })
    }
}
