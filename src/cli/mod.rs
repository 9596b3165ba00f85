//! CLI entry point for the Claude Code node.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Map, Value};

use crate::node::params;
use crate::types::{ClaudeModel, Operation, OutputFormat, SettingSource, ToolName};

/// Claude Code workflow node harness
#[derive(Parser, Debug)]
#[command(
    name = "claude-code-node",
    version,
    about = "Run Claude Code queries the way the workflow node does"
)]
pub struct Cli {
    /// Config file to load instead of the platform default
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single query
    Run(RunArgs),
    /// Run every item of a JSON parameter file
    Batch(BatchArgs),
    /// Print the node's parameter description
    Describe,
}

/// Arguments for `claude-code-node run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Prompt to send
    #[arg(short, long)]
    pub prompt: String,

    /// Continue the most recent conversation instead of starting one
    #[arg(long = "continue")]
    pub continue_conversation: bool,

    #[arg(short, long)]
    pub model: Option<ClaudeModel>,

    #[arg(short, long)]
    pub output_format: Option<OutputFormat>,

    /// Timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    #[arg(long)]
    pub max_turns: Option<u32>,

    #[arg(long)]
    pub project_path: Option<String>,

    #[arg(long)]
    pub system_prompt: Option<String>,

    /// Tool the agent may use (repeatable)
    #[arg(long = "allowed-tool")]
    pub allowed_tools: Vec<ToolName>,

    /// Settings source to load (repeatable)
    #[arg(long = "setting-source", conflicts_with = "isolated")]
    pub setting_sources: Vec<SettingSource>,

    /// Load no settings from the file system
    #[arg(long)]
    pub isolated: bool,

    /// Keep the default permission prompts
    #[arg(long)]
    pub require_permissions: bool,
}

/// Arguments for `claude-code-node batch`.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON file holding an array of parameter objects
    pub file: PathBuf,

    /// Record failed items and keep going
    #[arg(long)]
    pub continue_on_fail: bool,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl RunArgs {
    /// Parameter object for one host item. `debug` maps to the node's
    /// debug option.
    pub fn to_parameters(&self, debug: bool) -> Map<String, Value> {
        let mut item = Map::new();
        let operation = if self.continue_conversation {
            Operation::Continue
        } else {
            Operation::Query
        };
        item.insert(params::OPERATION.into(), json!(operation));
        item.insert(params::PROMPT.into(), json!(self.prompt));
        if let Some(model) = self.model {
            item.insert(params::MODEL.into(), json!(model));
        }
        if let Some(format) = self.output_format {
            item.insert(params::OUTPUT_FORMAT.into(), json!(format));
        }
        if let Some(timeout) = self.timeout {
            item.insert(params::TIMEOUT.into(), json!(timeout));
        }
        if let Some(turns) = self.max_turns {
            item.insert(params::MAX_TURNS.into(), json!(turns));
        }
        if let Some(path) = &self.project_path {
            item.insert(params::PROJECT_PATH.into(), json!(path));
        }
        if !self.allowed_tools.is_empty() {
            item.insert(params::ALLOWED_TOOLS.into(), json!(self.allowed_tools));
        }
        if self.isolated {
            item.insert(params::SETTING_SOURCES.into(), json!([]));
        } else if !self.setting_sources.is_empty() {
            item.insert(params::SETTING_SOURCES.into(), json!(self.setting_sources));
        }

        let mut additional = Map::new();
        if let Some(system_prompt) = &self.system_prompt {
            additional.insert("systemPrompt".into(), json!(system_prompt));
        }
        if self.require_permissions {
            additional.insert("requirePermissions".into(), json!(true));
        }
        if debug {
            additional.insert("debug".into(), json!(true));
        }
        if !additional.is_empty() {
            item.insert(params::ADDITIONAL_OPTIONS.into(), Value::Object(additional));
        }
        item
    }
}
