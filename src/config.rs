//! Configuration management for git-agent.
//!
//! Configuration is read from environment variables (a `.env` file in the
//! working directory is loaded first by the binary):
//! - `OPENAI_API_KEY` - Required. Credential for the language-model provider.
//! - `REPO_PATH` - Required. Path to the git repository to inspect. Must exist.
//! - `OPENAI_BASE_URL` - Optional. OpenAI-compatible API base. Defaults to `https://api.openai.com/v1`.
//! - `OPENAI_MODEL` - Optional. Model identifier. Defaults to `gpt-4o`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `MAX_TURNS` - Optional. Maximum agent loop turns. Defaults to `10`.
//! - `MCP_GIT_COMMAND` - Optional. Git MCP server launcher. Defaults to `uvx`.
//! - `MCP_GIT_ARGS` - Optional. Whitespace-separated launcher arguments. Defaults to `mcp-server-git`.
//! - `MCP_LOG_STDOUT` - Optional. Log tool output received from the server. Defaults to `true`.
//! - `MCP_LOG_STDERR` - Optional. Forward the server's stderr to the log. Defaults to `true`.

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// How to launch the git MCP server.
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    /// Executable to run (e.g. `uvx`)
    pub command: String,

    /// Arguments passed to the executable
    pub args: Vec<String>,

    /// Log tool output received over the server's stdout channel
    pub log_stdout: bool,

    /// Forward the server's stderr lines to the log
    pub log_stderr: bool,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            command: "uvx".to_string(),
            args: vec!["mcp-server-git".to_string()],
            log_stdout: true,
            log_stderr: true,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Language-model provider API key
    pub api_key: String,

    /// Absolute path of the repository the agent inspects
    pub repo_path: PathBuf,

    /// OpenAI-compatible API base URL
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum turns for the agent loop
    pub max_turns: usize,

    /// Git MCP server launch settings
    pub mcp: McpServerConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENAI_API_KEY` or `REPO_PATH`
    /// is unset or blank, and `ConfigError::InvalidValue` if `REPO_PATH` does
    /// not exist or an optional value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let repo_path = non_empty("REPO_PATH")
            .ok_or_else(|| ConfigError::MissingEnvVar("REPO_PATH".to_string()))?;
        let repo_path = std::fs::canonicalize(&repo_path).map_err(|e| {
            ConfigError::InvalidValue(
                "REPO_PATH".to_string(),
                format!("{} does not exist ({})", repo_path, e),
            )
        })?;

        let api_key = non_empty("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let base_url = non_empty("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let host = non_empty("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = non_empty("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_turns: usize = non_empty("MAX_TURNS")
            .unwrap_or_else(|| "10".to_string())
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_TURNS".to_string(), format!("{}", e)))?;
        if max_turns == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_TURNS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let defaults = McpServerConfig::default();
        let mcp = McpServerConfig {
            command: non_empty("MCP_GIT_COMMAND").unwrap_or(defaults.command),
            args: non_empty("MCP_GIT_ARGS")
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or(defaults.args),
            log_stdout: bool_var(&non_empty, "MCP_LOG_STDOUT", defaults.log_stdout)?,
            log_stderr: bool_var(&non_empty, "MCP_LOG_STDERR", defaults.log_stderr)?,
        };

        Ok(Self {
            api_key,
            repo_path,
            base_url,
            model,
            host,
            port,
            max_turns,
            mcp,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, repo_path: PathBuf) -> Self {
        Self {
            api_key,
            repo_path,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_turns: 10,
            mcp: McpServerConfig::default(),
        }
    }
}

fn bool_var<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| parse_bool(&v).map_err(|e| ConfigError::InvalidValue(key.to_string(), e)))
        .transpose()
        .map(|v| v.unwrap_or(default))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_loads_required_values_with_defaults() {
        let repo = tempfile::tempdir().unwrap();
        let repo_str = repo.path().to_str().unwrap();
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("REPO_PATH", repo_str),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.repo_path, std::fs::canonicalize(repo.path()).unwrap());
        assert!(config.repo_path.is_absolute());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_turns, 10);
        assert_eq!(config.mcp.command, "uvx");
        assert_eq!(config.mcp.args, vec!["mcp-server-git".to_string()]);
        assert!(config.mcp.log_stdout);
        assert!(config.mcp.log_stderr);
    }

    #[test]
    fn test_missing_repo_path_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "REPO_PATH"));
    }

    #[test]
    fn test_nonexistent_repo_path_is_rejected() {
        let repo = tempfile::tempdir().unwrap();
        let missing = repo.path().join("does-not-exist");
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("REPO_PATH", missing.to_str().unwrap()),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "REPO_PATH"));
    }

    #[test]
    fn test_missing_or_blank_api_key_is_rejected() {
        let repo = tempfile::tempdir().unwrap();
        let repo_str = repo.path().to_str().unwrap();

        let err = Config::from_lookup(lookup_from(&[("REPO_PATH", repo_str)])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "OPENAI_API_KEY"));

        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "   "),
            ("REPO_PATH", repo_str),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "OPENAI_API_KEY"));
    }

    #[test]
    fn test_optional_overrides_are_applied() {
        let repo = tempfile::tempdir().unwrap();
        let repo_str = repo.path().to_str().unwrap();
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("REPO_PATH", repo_str),
            ("OPENAI_MODEL", "gpt-4.1-mini"),
            ("PORT", "9001"),
            ("MAX_TURNS", "4"),
            ("MCP_GIT_COMMAND", "python"),
            ("MCP_GIT_ARGS", "-m  mcp_server_git"),
            ("MCP_LOG_STDERR", "off"),
        ]))
        .unwrap();

        assert_eq!(config.model, "gpt-4.1-mini");
        assert_eq!(config.port, 9001);
        assert_eq!(config.max_turns, 4);
        assert_eq!(config.mcp.command, "python");
        assert_eq!(config.mcp.args, vec!["-m".to_string(), "mcp_server_git".to_string()]);
        assert!(!config.mcp.log_stderr);
    }

    #[test]
    fn test_malformed_optional_values_are_rejected() {
        let repo = tempfile::tempdir().unwrap();
        let repo_str = repo.path().to_str().unwrap();

        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("REPO_PATH", repo_str),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "PORT"));

        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("REPO_PATH", repo_str),
            ("MAX_TURNS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "MAX_TURNS"));

        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("REPO_PATH", repo_str),
            ("MCP_LOG_STDOUT", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "MCP_LOG_STDOUT"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool(" Yes "), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("sometimes").is_err());
    }
}
