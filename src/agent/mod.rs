//! Agent module - the reasoning loop behind `/chat`.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build context with system prompt and user input
//! 2. Call the LLM with the tools listed from every connected tool server
//! 3. If the LLM requests tool calls, run them and feed the results back
//! 4. Repeat until the LLM produces a final answer or the turn budget runs out

mod agent_loop;
mod prompt;

#[cfg(test)]
pub(crate) mod test_support;

pub use agent_loop::{Agent, AgentError};
pub use prompt::{build_system_prompt, git_instructions, GIT_AGENT_INSTRUCTIONS, GIT_AGENT_NAME};
