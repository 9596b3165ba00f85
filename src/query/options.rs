//! Option object passed to the agent SDK.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::types::{ExecutionContext, Operation, SettingSource, ToolName};

/// How the agent treats tool permission prompts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PermissionMode {
    /// Ask before each sensitive tool call.
    Default,
    /// Run every tool call without asking.
    BypassPermissions,
}

/// Options recognised by the agent's query call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    pub max_turns: u32,
    pub permission_mode: PermissionMode,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_servers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<ToolName>>,
    /// An explicit empty list disables settings loading (isolation mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting_sources: Option<Vec<SettingSource>>,
    #[serde(
        rename = "continue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub continue_conversation: Option<bool>,
}

impl QueryOptions {
    pub fn from_context(ctx: &ExecutionContext) -> Self {
        let permission_mode = if ctx.require_permissions {
            PermissionMode::Default
        } else {
            PermissionMode::BypassPermissions
        };

        Self {
            max_turns: ctx.max_turns,
            permission_mode,
            model: ctx.model.as_str().to_string(),
            system_prompt: ctx
                .system_prompt
                .clone()
                .filter(|prompt| !prompt.trim().is_empty()),
            cwd: ctx.working_directory().map(str::to_string),
            mcp_servers: ctx.mcp_servers.clone().filter(|servers| !servers.is_empty()),
            allowed_tools: (!ctx.allowed_tools.is_empty()).then(|| ctx.allowed_tools.clone()),
            setting_sources: ctx.setting_sources.clone(),
            continue_conversation: (ctx.operation == Operation::Continue).then_some(true),
        }
    }
}
