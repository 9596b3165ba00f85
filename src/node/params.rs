//! Parameter schema declaration and per-item parameter resolution.

use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Map, Value};
use strum::IntoEnumIterator;

use super::NodeHost;
use crate::error::{NodeError, Result};
use crate::types::{
    ClaudeModel, ExecutionContext, Operation, OutputFormat, SettingSource, ToolName,
};

pub const OPERATION: &str = "operation";
pub const PROMPT: &str = "prompt";
pub const MODEL: &str = "model";
pub const MAX_TURNS: &str = "maxTurns";
pub const TIMEOUT: &str = "timeout";
pub const PROJECT_PATH: &str = "projectPath";
pub const OUTPUT_FORMAT: &str = "outputFormat";
pub const ALLOWED_TOOLS: &str = "allowedTools";
pub const SETTING_SOURCES: &str = "settingSources";
pub const ADDITIONAL_OPTIONS: &str = "additionalOptions";
pub const SYSTEM_PROMPT: &str = "additionalOptions.systemPrompt";
pub const REQUIRE_PERMISSIONS: &str = "additionalOptions.requirePermissions";
pub const DEBUG: &str = "additionalOptions.debug";

/// Defaults applied to parameters an item leaves unset.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefaults {
    pub model: ClaudeModel,
    pub max_turns: u32,
    pub timeout_secs: u64,
    /// Passed through to the agent untouched.
    pub mcp_servers: Option<Map<String, Value>>,
}

impl Default for ParameterDefaults {
    fn default() -> Self {
        Self {
            model: ClaudeModel::default(),
            max_turns: 10,
            timeout_secs: 300,
            mcp_servers: None,
        }
    }
}

/// Node metadata shown by the host.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    pub display_name: &'static str,
    pub name: &'static str,
    pub version: u32,
    pub description: &'static str,
    pub properties: Vec<ParameterSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterKind {
    String,
    Number,
    Boolean,
    Options,
    MultiOptions,
    Collection,
}

/// Declaration of one node parameter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub display_name: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub default: Value,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Nested parameters of a collection.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ParameterSpec>,
}

impl ParameterSpec {
    fn new(
        name: &'static str,
        display_name: &'static str,
        kind: ParameterKind,
        default: Value,
        description: &'static str,
    ) -> Self {
        Self {
            display_name,
            name,
            kind,
            default,
            required: false,
            description,
            options: Vec::new(),
            fields: Vec::new(),
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn options<T: IntoEnumIterator + ToString>(mut self) -> Self {
        self.options = T::iter().map(|value| value.to_string()).collect();
        self
    }

    fn fields(mut self, fields: Vec<ParameterSpec>) -> Self {
        self.fields = fields;
        self
    }
}

/// The node's parameter surface; `defaults` fills the default values.
pub fn node_description(defaults: &ParameterDefaults) -> NodeDescription {
    use ParameterKind as K;

    let additional = vec![
        ParameterSpec::new(
            "systemPrompt",
            "System Prompt",
            K::String,
            json!(""),
            "Additional system prompt for the agent",
        ),
        ParameterSpec::new(
            "requirePermissions",
            "Require Permissions",
            K::Boolean,
            json!(false),
            "Ask before tool use instead of bypassing permission checks",
        ),
        ParameterSpec::new(
            "debug",
            "Debug Mode",
            K::Boolean,
            json!(false),
            "Log every message and include raw messages in structured output",
        ),
    ];

    NodeDescription {
        display_name: "Claude Code",
        name: "claudeCode",
        version: 1,
        description: "Run a Claude Code agent query and return its result",
        properties: vec![
            ParameterSpec::new(
                OPERATION,
                "Operation",
                K::Options,
                json!(Operation::default().to_string()),
                "Start a new conversation or continue the previous one",
            )
            .options::<Operation>(),
            ParameterSpec::new(
                PROMPT,
                "Prompt",
                K::String,
                json!(""),
                "The prompt sent to the agent",
            )
            .required(),
            ParameterSpec::new(
                MODEL,
                "Model",
                K::Options,
                json!(defaults.model.to_string()),
                "Model used by the agent",
            )
            .options::<ClaudeModel>(),
            ParameterSpec::new(
                MAX_TURNS,
                "Max Turns",
                K::Number,
                json!(defaults.max_turns),
                "Maximum number of agent turns",
            ),
            ParameterSpec::new(
                TIMEOUT,
                "Timeout",
                K::Number,
                json!(defaults.timeout_secs),
                "Maximum execution time in seconds",
            ),
            ParameterSpec::new(
                PROJECT_PATH,
                "Project Path",
                K::String,
                json!(""),
                "Directory the agent runs in; empty keeps the host's working directory",
            ),
            ParameterSpec::new(
                OUTPUT_FORMAT,
                "Output Format",
                K::Options,
                json!(OutputFormat::default().to_string()),
                "Shape of the item output",
            )
            .options::<OutputFormat>(),
            ParameterSpec::new(
                ALLOWED_TOOLS,
                "Allowed Tools",
                K::MultiOptions,
                json!([]),
                "Tools the agent may use",
            )
            .options::<ToolName>(),
            ParameterSpec::new(
                SETTING_SOURCES,
                "Setting Sources",
                K::MultiOptions,
                json!([]),
                "Settings files the agent loads; empty runs it in isolation",
            )
            .options::<SettingSource>(),
            ParameterSpec::new(
                ADDITIONAL_OPTIONS,
                "Additional Options",
                K::Collection,
                json!({}),
                "",
            )
            .fields(additional),
        ],
    }
}

/// Read one item's parameters into an [`ExecutionContext`].
///
/// The prompt is not checked here; [`ExecutionContext::validate`] does that.
pub fn resolve_context(
    host: &dyn NodeHost,
    item_index: usize,
    defaults: &ParameterDefaults,
) -> Result<ExecutionContext> {
    let p = Params { host, item_index };

    let max_turns = match p.count(MAX_TURNS)? {
        Some(turns) => u32::try_from(turns)
            .map_err(|_| NodeError::parameter(MAX_TURNS, format!("{turns} is too large")))?,
        None => defaults.max_turns,
    };

    Ok(ExecutionContext::builder()
        .prompt(p.string(PROMPT)?.unwrap_or_default())
        .operation(p.enumerated(OPERATION)?.unwrap_or_default())
        .model(p.enumerated(MODEL)?.unwrap_or(defaults.model))
        .max_turns(max_turns)
        .timeout_secs(p.count(TIMEOUT)?.unwrap_or(defaults.timeout_secs))
        .maybe_project_path(p.string(PROJECT_PATH)?)
        .output_format(p.enumerated(OUTPUT_FORMAT)?.unwrap_or_default())
        .allowed_tools(p.list(ALLOWED_TOOLS)?.unwrap_or_default())
        .maybe_setting_sources(p.list(SETTING_SOURCES)?)
        .maybe_system_prompt(p.string(SYSTEM_PROMPT)?)
        .require_permissions(p.boolean(REQUIRE_PERMISSIONS)?.unwrap_or(false))
        .debug(p.boolean(DEBUG)?.unwrap_or(false))
        .maybe_mcp_servers(defaults.mcp_servers.clone())
        .build())
}

struct Params<'a> {
    host: &'a dyn NodeHost,
    item_index: usize,
}

impl Params<'_> {
    fn get(&self, name: &str) -> Option<Value> {
        self.host.parameter(name, self.item_index)
    }

    fn string(&self, name: &str) -> Result<Option<String>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(other) => Err(NodeError::parameter(
                name,
                format!("expected a string, got {other}"),
            )),
        }
    }

    fn enumerated<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.string(name)?
            .map(|value| parse_member(name, &value))
            .transpose()
    }

    fn boolean(&self, name: &str) -> Result<Option<bool>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(value)),
            Some(other) => Err(NodeError::parameter(
                name,
                format!("expected a boolean, got {other}"),
            )),
        }
    }

    /// A positive whole number; integral floats are accepted.
    fn count(&self, name: &str) -> Result<Option<u64>> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let count = match &value {
            Value::Number(number) => number.as_u64().or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            }),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        };
        match count {
            Some(0) => Err(NodeError::parameter(name, "must be at least 1")),
            Some(count) => Ok(Some(count)),
            None => Err(NodeError::parameter(
                name,
                format!("expected a positive whole number, got {value}"),
            )),
        }
    }

    fn list<T: FromStr>(&self, name: &str) -> Result<Option<Vec<T>>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| match entry {
                    Value::String(value) => parse_member(name, value),
                    other => Err(NodeError::parameter(
                        name,
                        format!("expected a list of strings, found {other}"),
                    )),
                })
                .collect::<Result<Vec<T>>>()
                .map(Some),
            Some(other) => Err(NodeError::parameter(
                name,
                format!("expected a list, got {other}"),
            )),
        }
    }
}

fn parse_member<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| NodeError::parameter(name, format!("unsupported value `{value}`")))
}
