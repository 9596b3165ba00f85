//! Convenience re-exports for common use.

pub use crate::aggregate::AggregatedState;
pub use crate::config::NodeConfig;
pub use crate::error::{ErrorCategory, Failure, FailureKind, NodeError, Result};
pub use crate::format::{format_output, FormattedOutput};
pub use crate::node::{ClaudeCodeNode, Node, NodeHost, NodeOperationError, OutputItem, StaticHost};
pub use crate::query::{AgentSdk, ClaudeCli, QueryRequest, RecordStream};
pub use crate::types::{
    ClaudeModel, ExecutionContext, Operation, OutputFormat, ResponseRecord, SettingSource,
    ToolName,
};
