//! Claude Code workflow node.
//!
//! Forwards a prompt to the Claude Code agent, aggregates the streamed
//! response records and reshapes them into one of three output formats
//! (structured, messages, text). Failures are translated into categorized,
//! human-readable errors and reported per item under the host's
//! continue-on-fail policy.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use claude_code_node::prelude::*;
//!
//! # async fn example() -> claude_code_node::error::Result<()> {
//! let node = ClaudeCodeNode::new(Arc::new(ClaudeCli::default()));
//! let ctx = ExecutionContext::builder()
//!     .prompt("Summarize the README")
//!     .output_format(OutputFormat::Text)
//!     .build();
//! let output = node.run(&ctx).await?;
//! println!("{}", serde_json::to_string_pretty(&output)?);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod format;
pub mod node;
pub mod prelude;
pub mod query;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
