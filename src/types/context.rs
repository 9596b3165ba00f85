//! Per-item execution context and its enumerated settings.

use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString};

use crate::error::{NodeError, Result};

/// What the node asks the agent to do.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    /// Start a new conversation.
    #[default]
    Query,
    /// Continue the most recent conversation in the project.
    Continue,
}

/// Model aliases understood by the agent CLI.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClaudeModel {
    #[default]
    Sonnet,
    Opus,
    Haiku,
}

impl ClaudeModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sonnet => "sonnet",
            Self::Opus => "opus",
            Self::Haiku => "haiku",
        }
    }
}

/// Shape of the item output.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Summary, outcome and metrics.
    #[default]
    Structured,
    /// Condensed list of every record.
    Messages,
    /// Final result text only.
    Text,
}

/// Settings file locations the agent may load.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SettingSource {
    User,
    Project,
    Local,
}

/// Tools the node lets a user allow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum ToolName {
    Task,
    Bash,
    Glob,
    Grep,
    #[serde(rename = "LS")]
    #[strum(serialize = "LS")]
    Ls,
    #[serde(rename = "exit_plan_mode")]
    #[strum(serialize = "exit_plan_mode")]
    ExitPlanMode,
    Read,
    Edit,
    MultiEdit,
    Write,
    NotebookRead,
    NotebookEdit,
    WebFetch,
    TodoRead,
    TodoWrite,
    WebSearch,
}

/// Immutable inputs for one query invocation.
#[derive(Debug, Clone, Builder)]
pub struct ExecutionContext {
    #[builder(into)]
    pub prompt: String,
    #[builder(default)]
    pub operation: Operation,
    #[builder(default)]
    pub model: ClaudeModel,
    #[builder(default = 10)]
    pub max_turns: u32,
    #[builder(default = 300)]
    pub timeout_secs: u64,
    #[builder(into)]
    pub project_path: Option<String>,
    #[builder(default)]
    pub output_format: OutputFormat,
    #[builder(default)]
    pub allowed_tools: Vec<ToolName>,
    /// `None` lets the agent load its default settings; `Some(vec![])` isolates it.
    pub setting_sources: Option<Vec<SettingSource>>,
    #[builder(into)]
    pub system_prompt: Option<String>,
    #[builder(default)]
    pub require_permissions: bool,
    #[builder(default)]
    pub debug: bool,
    pub mcp_servers: Option<Map<String, Value>>,
}

impl ExecutionContext {
    /// Reject contexts that must never reach the agent.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(NodeError::Validation(
                "Prompt is required and cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Wall-clock budget for the whole query.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_secs.saturating_mul(1000))
    }

    /// Project path, if one was given and is not blank.
    pub fn working_directory(&self) -> Option<&str> {
        self.project_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}
