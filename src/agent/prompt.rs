//! System prompt templates for the agent.

use std::path::Path;

/// Name of the git agent.
pub const GIT_AGENT_NAME: &str = "GitAgent";

/// Instructions for the git agent.
pub const GIT_AGENT_INSTRUCTIONS: &str = "You are a helpful assistant.
Whenever a user asks about git commits, branches, logs, status, merges, pulls, or pushes,
call the MCP Git tool via your MCP server and then produce the answer.
Always provide your final answer after using the tool.";

/// Instructions for the git agent bound to one repository.
pub fn git_instructions(repo_path: &Path) -> String {
    format!(
        "{GIT_AGENT_INSTRUCTIONS}\n\nThe repository to inspect is at: {repo}\nPass this path as `repo_path` to any tool that asks for one.",
        repo = repo_path.display()
    )
}

/// Build the system prompt for an agent.
pub fn build_system_prompt(name: &str, instructions: &str) -> String {
    format!("You are {name}.\n\n{}", instructions.trim())
}
