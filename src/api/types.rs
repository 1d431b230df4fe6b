//! API request and response types.

use serde::{Deserialize, Serialize};

/// Label identifying answers produced by the agent.
pub const RESPONSE_SOURCE: &str = "gpt-agent";

/// Request to ask the agent a question.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The natural-language query
    pub query: String,
}

/// The agent's answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    /// Always `gpt-agent`
    pub source: String,

    /// Final answer text
    pub result: String,
}

impl ChatResponse {
    pub fn from_agent(result: String) -> Self {
        Self {
            source: RESPONSE_SOURCE.to_string(),
            result,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub detail: String,
}
