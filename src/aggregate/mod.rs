//! Message classification and aggregation over one record stream.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::error::{NodeError, Result};
use crate::query::RecordStream;
use crate::types::{RecordKind, ResponseRecord, ResultRecord, SystemRecord};

const TRACE_PREVIEW_CHARS: usize = 100;

/// Summary derived from one linear pass over the records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedState {
    records: Vec<ResponseRecord>,
    system: Vec<usize>,
    user: Vec<usize>,
    assistant: Vec<usize>,
    results: Vec<usize>,
    tool_use_count: usize,
    init: Option<usize>,
    result: Option<usize>,
}

impl AggregatedState {
    /// Every record, in emission order.
    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    /// Records of one kind, in emission order.
    pub fn partition(&self, kind: RecordKind) -> impl Iterator<Item = &ResponseRecord> + '_ {
        let indices = match kind {
            RecordKind::System => &self.system,
            RecordKind::User => &self.user,
            RecordKind::Assistant => &self.assistant,
            RecordKind::Result => &self.results,
        };
        indices.iter().map(|&index| &self.records[index])
    }

    pub fn user_message_count(&self) -> usize {
        self.user.len()
    }

    pub fn assistant_message_count(&self) -> usize {
        self.assistant.len()
    }

    /// Assistant records whose first content block is a tool invocation.
    pub fn tool_use_count(&self) -> usize {
        self.tool_use_count
    }

    /// The first `system/init` record.
    pub fn init(&self) -> Option<&SystemRecord> {
        match self.init.map(|index| &self.records[index]) {
            Some(ResponseRecord::System(system)) => Some(system),
            _ => None,
        }
    }

    /// The terminal `result` record (the last one, should several arrive).
    pub fn result(&self) -> Option<&ResultRecord> {
        match self.result.map(|index| &self.records[index]) {
            Some(ResponseRecord::Result(result)) => Some(result),
            _ => None,
        }
    }

    /// Tools reported by the init record, empty if there was none.
    pub fn tools_available(&self) -> &[String] {
        self.init()
            .and_then(|init| init.tools.as_deref())
            .unwrap_or_default()
    }

    /// True iff the terminal record reports `success`.
    pub fn success(&self) -> bool {
        self.result().is_some_and(ResultRecord::is_success)
    }
}

/// Incremental aggregator; feed records in order, then call [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct MessageAggregator {
    state: AggregatedState,
    debug: bool,
}

impl MessageAggregator {
    /// With `debug` set, a trace line is emitted per record.
    pub fn new(debug: bool) -> Self {
        Self {
            state: AggregatedState::default(),
            debug,
        }
    }

    pub fn push(&mut self, record: ResponseRecord) {
        let index = self.state.records.len();
        if self.debug {
            trace_record(index, &record);
        }

        let state = &mut self.state;
        match &record {
            ResponseRecord::System(system) => {
                state.system.push(index);
                if system.is_init() && state.init.is_none() {
                    state.init = Some(index);
                }
            }
            ResponseRecord::User(_) => state.user.push(index),
            ResponseRecord::Assistant(chat) => {
                state.assistant.push(index);
                if chat.message.first_block().is_some_and(|block| block.is_tool_use()) {
                    state.tool_use_count += 1;
                }
            }
            ResponseRecord::Result(_) => {
                state.results.push(index);
                state.result = Some(index);
            }
        }
        state.records.push(record);
    }

    pub fn finish(self) -> AggregatedState {
        self.state
    }
}

/// Drain `stream` into an [`AggregatedState`].
///
/// Stops with [`NodeError::Cancelled`] as soon as `cancel` fires, whether or
/// not the stream itself honours the token. Any stream error ends the drain.
pub async fn collect(
    mut stream: RecordStream,
    cancel: &CancellationToken,
    debug: bool,
) -> Result<AggregatedState> {
    let mut aggregator = MessageAggregator::new(debug);
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(NodeError::Cancelled),
            next = stream.next() => next,
        };
        match next {
            Some(Ok(record)) => aggregator.push(record),
            Some(Err(err)) => return Err(err),
            None => break,
        }
    }
    Ok(aggregator.finish())
}

fn trace_record(index: usize, record: &ResponseRecord) {
    let kind = record.kind();
    let subtype = record.subtype().unwrap_or("-");
    match record {
        ResponseRecord::Assistant(chat) => {
            let block = chat.message.first_block();
            if let Some(text) = block.and_then(|b| b.text()) {
                tracing::debug!(index, %kind, text = %preview(text), "record received");
            } else if let Some(tool) = block.and_then(|b| b.tool_name()) {
                tracing::debug!(index, %kind, tool, "record received");
            } else {
                tracing::debug!(index, %kind, "record received");
            }
        }
        _ => tracing::debug!(index, %kind, subtype, "record received"),
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TRACE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
