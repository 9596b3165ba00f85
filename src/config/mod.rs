//! Configuration system (layered: code > env > config file > defaults).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::node::ParameterDefaults;
use crate::types::ClaudeModel;

const ENV_CLI_PATH: &str = "CLAUDE_CODE_CLI_PATH";
const ENV_DEFAULT_TIMEOUT: &str = "CLAUDE_CODE_DEFAULT_TIMEOUT";
const ENV_DEFAULT_MODEL: &str = "CLAUDE_CODE_DEFAULT_MODEL";
const ENV_DEFAULT_MAX_TURNS: &str = "CLAUDE_CODE_DEFAULT_MAX_TURNS";
const ENV_LOG_LEVEL: &str = "CLAUDE_CODE_LOG_LEVEL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value `{value}` for {key}")]
    InvalidValue { key: String, value: String },
}

/// Process-wide settings for the node and its CLI harness.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// Claude Code executable, a name on PATH or a full path.
    pub cli_path: String,
    pub default_model: ClaudeModel,
    pub default_timeout_secs: u64,
    pub default_max_turns: u32,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// MCP server definitions forwarded to every query.
    pub mcp_servers: Option<Map<String, Value>>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            cli_path: "claude".to_string(),
            default_model: ClaudeModel::default(),
            default_timeout_secs: 300,
            default_max_turns: 10,
            log_level: "info".to_string(),
            mcp_servers: None,
        }
    }
}

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    cli_path: Option<String>,
    default_model: Option<ClaudeModel>,
    default_timeout_secs: Option<u64>,
    default_max_turns: Option<u32>,
    log_level: Option<String>,
    mcp_servers: Option<Map<String, Value>>,
}

impl NodeConfig {
    /// Defaults, then the default config file if it exists, then environment
    /// variables (a `.env` file is loaded first when present).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let base = match Self::default_path().filter(|path| path.is_file()) {
            Some(path) => Self::default().merge_file(&path)?,
            None => Self::default(),
        };
        base.apply_env(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with one config file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        Self::default().merge_file(path)
    }

    /// `<config dir>/claude-code-node/config.toml` for the current platform.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "claude-code-node")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn merge_file(mut self, path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        if let Some(cli_path) = file.cli_path {
            self.cli_path = cli_path;
        }
        if let Some(model) = file.default_model {
            self.default_model = model;
        }
        if let Some(timeout) = file.default_timeout_secs {
            self.default_timeout_secs = timeout;
        }
        if let Some(turns) = file.default_max_turns {
            self.default_max_turns = turns;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if file.mcp_servers.is_some() {
            self.mcp_servers = file.mcp_servers;
        }
        Ok(self)
    }

    /// Overlay environment values read through `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_CLI_PATH).filter(|v| !v.trim().is_empty()) {
            self.cli_path = path;
        }
        if let Some(model) = lookup(ENV_DEFAULT_MODEL) {
            self.default_model = parse_env(ENV_DEFAULT_MODEL, &model)?;
        }
        if let Some(timeout) = lookup(ENV_DEFAULT_TIMEOUT) {
            self.default_timeout_secs = parse_env(ENV_DEFAULT_TIMEOUT, &timeout)?;
        }
        if let Some(turns) = lookup(ENV_DEFAULT_MAX_TURNS) {
            self.default_max_turns = parse_env(ENV_DEFAULT_MAX_TURNS, &turns)?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        Ok(self)
    }

    /// Parameter defaults the node applies to unset item parameters.
    pub fn parameter_defaults(&self) -> ParameterDefaults {
        ParameterDefaults {
            model: self.default_model,
            max_turns: self.default_max_turns,
            timeout_secs: self.default_timeout_secs,
            mcp_servers: self.mcp_servers.clone(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
