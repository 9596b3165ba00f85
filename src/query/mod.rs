//! Query invocation: the agent SDK seam and the per-item drain.

pub mod cli;
pub mod options;

pub use cli::ClaudeCli;
pub use options::{PermissionMode, QueryOptions};

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::aggregate::{self, AggregatedState};
use crate::error::{NodeError, Result};
use crate::types::{ExecutionContext, ResponseRecord};
use crate::util::timeout::TimeoutGuard;

/// Ordered records produced by one query.
pub type RecordStream = BoxStream<'static, std::result::Result<ResponseRecord, NodeError>>;

/// Arguments of one agent query.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub prompt: String,
    /// Fires when the item's timeout elapses; implementations should stop
    /// producing records and release the underlying process.
    pub cancel: CancellationToken,
    pub options: QueryOptions,
}

/// Streaming query function of the agent SDK.
#[async_trait]
pub trait AgentSdk: Send + Sync {
    async fn query(&self, request: QueryRequest) -> Result<RecordStream>;
}

/// Run one query to completion and aggregate its records.
///
/// The timeout guard lives for the whole call, so the timer is released on
/// success and on every error path.
pub async fn run_query(sdk: &dyn AgentSdk, ctx: &ExecutionContext) -> Result<AggregatedState> {
    let run_id = Uuid::new_v4();
    let span = tracing::debug_span!("claude_query", %run_id, model = %ctx.model);

    async move {
        let options = QueryOptions::from_context(ctx);
        let guard = TimeoutGuard::arm(ctx.timeout());
        tracing::debug!(
            operation = %ctx.operation,
            max_turns = options.max_turns,
            timeout_secs = ctx.timeout_secs,
            permission_mode = %options.permission_mode,
            "starting query"
        );

        let request = QueryRequest {
            prompt: ctx.prompt.clone(),
            cancel: guard.token().clone(),
            options,
        };
        let stream = sdk.query(request).await?;
        let state = match aggregate::collect(stream, guard.token(), ctx.debug).await {
            Ok(state) => state,
            Err(err) => {
                if guard.fired() {
                    tracing::warn!(timeout_secs = ctx.timeout_secs, "query timed out");
                }
                return Err(err);
            }
        };

        tracing::debug!(
            records = state.records().len(),
            has_result = state.result().is_some(),
            "query drained"
        );
        Ok(state)
    }
    .instrument(span)
    .await
}
