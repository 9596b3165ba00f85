//! Host lifecycle contract and the Claude Code node.

pub mod host;
pub mod params;

pub use host::StaticHost;
pub use params::{node_description, resolve_context, NodeDescription, ParameterDefaults};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::NodeConfig;
use crate::error::{translate, Failure, NodeError, Result};
use crate::format::{format_output, FormattedOutput};
use crate::query::{run_query, AgentSdk, ClaudeCli};
use crate::types::{ExecutionContext, RecordKind, Usage};

/// What the node needs from the workflow engine.
pub trait NodeHost: Send + Sync {
    /// Number of input items in the batch.
    fn item_count(&self) -> usize;

    /// Value of parameter `name` for one item, `None` when unset.
    fn parameter(&self, name: &str, item_index: usize) -> Option<Value>;

    /// Whether a failed item should be recorded instead of aborting the batch.
    fn continue_on_fail(&self) -> bool;

    /// Identity of the node, used in error attribution.
    fn node_name(&self) -> &str;
}

/// Host-level error that aborts the remaining batch.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct NodeOperationError {
    pub node: String,
    pub message: String,
    pub item_index: usize,
    pub description: Option<String>,
}

impl NodeOperationError {
    pub fn new(node: impl Into<String>, message: impl Into<String>, item_index: usize) -> Self {
        Self {
            node: node.into(),
            message: message.into(),
            item_index,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A node implementation as seen by the workflow engine.
#[async_trait]
pub trait Node: Send + Sync {
    fn description(&self) -> NodeDescription;

    async fn execute(
        &self,
        host: &dyn NodeHost,
    ) -> std::result::Result<Vec<OutputItem>, NodeOperationError>;
}

/// One output record, paired with the input item it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputItem {
    pub json: ItemPayload,
    pub paired_item: PairedItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairedItem {
    pub item: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemPayload {
    Output(FormattedOutput),
    Failure(FailureRecord),
}

/// Recorded in place of an output when continue-on-fail is active.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub error: String,
    pub error_type: String,
    pub error_details: String,
    pub success: bool,
}

impl From<&Failure> for FailureRecord {
    fn from(failure: &Failure) -> Self {
        Self {
            error: failure.message.clone(),
            error_type: failure.error_type().to_string(),
            error_details: failure.details.clone(),
            success: false,
        }
    }
}

impl OutputItem {
    fn new(item_index: usize, json: ItemPayload) -> Self {
        Self {
            json,
            paired_item: PairedItem { item: item_index },
        }
    }
}

/// Forwards each item's prompt to the agent and shapes the reply.
pub struct ClaudeCodeNode {
    sdk: Arc<dyn AgentSdk>,
    defaults: ParameterDefaults,
}

impl ClaudeCodeNode {
    pub fn new(sdk: Arc<dyn AgentSdk>) -> Self {
        Self {
            sdk,
            defaults: ParameterDefaults::default(),
        }
    }

    /// A node that talks to the CLI named in `config`.
    pub fn from_config(config: &NodeConfig) -> Self {
        Self::new(Arc::new(ClaudeCli::new(config.cli_path.clone())))
            .with_defaults(config.parameter_defaults())
    }

    /// A node configured from the environment and the default config file.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(&NodeConfig::from_env()?))
    }

    pub fn with_defaults(mut self, defaults: ParameterDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &ParameterDefaults {
        &self.defaults
    }

    /// Run one resolved context through query, aggregation and formatting.
    pub async fn run(&self, ctx: &ExecutionContext) -> Result<FormattedOutput> {
        ctx.validate()?;
        let state = run_query(self.sdk.as_ref(), ctx).await?;

        if let Some(terminal) = state.result() {
            tracing::debug!(
                subtype = %terminal.subtype,
                result_records = state.partition(RecordKind::Result).count(),
                num_turns = ?terminal.num_turns,
                total_tokens = ?terminal.usage.as_ref().and_then(Usage::total_tokens),
                "terminal record"
            );
        } else {
            tracing::warn!(records = state.records().len(), "stream ended without a result record");
        }

        Ok(format_output(&state, ctx.output_format, ctx.debug))
    }

    async fn process_item(
        &self,
        host: &dyn NodeHost,
        item_index: usize,
    ) -> std::result::Result<FormattedOutput, Failure> {
        let ctx = resolve_context(host, item_index, &self.defaults)
            .map_err(|err| report(&err, item_index, self.defaults.timeout_secs))?;
        self.run(&ctx)
            .await
            .map_err(|err| report(&err, item_index, ctx.timeout_secs))
    }
}

fn report(error: &NodeError, item_index: usize, timeout_secs: u64) -> Failure {
    let failure = translate(error, timeout_secs);
    tracing::error!(
        item_index,
        category = %error.category(),
        recovery = ?error.recovery_suggestion(),
        kind = %failure.kind,
        error = ?error,
        "{}",
        failure.message
    );
    failure
}

#[async_trait]
impl Node for ClaudeCodeNode {
    fn description(&self) -> NodeDescription {
        node_description(&self.defaults)
    }

    async fn execute(
        &self,
        host: &dyn NodeHost,
    ) -> std::result::Result<Vec<OutputItem>, NodeOperationError> {
        let mut items = Vec::with_capacity(host.item_count());

        for item_index in 0..host.item_count() {
            match self.process_item(host, item_index).await {
                Ok(output) => items.push(OutputItem::new(item_index, ItemPayload::Output(output))),
                Err(failure) if host.continue_on_fail() => {
                    items.push(OutputItem::new(
                        item_index,
                        ItemPayload::Failure(FailureRecord::from(&failure)),
                    ));
                }
                Err(failure) => {
                    let mut error =
                        NodeOperationError::new(host.node_name(), failure.message, item_index);
                    error.description = failure.description;
                    return Err(error);
                }
            }
        }

        Ok(items)
    }
}
