//! Shared test helpers and mock agent SDK.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

use claude_code_node::error::NodeError;
use claude_code_node::node::{ClaudeCodeNode, StaticHost};
use claude_code_node::query::{AgentSdk, QueryRequest, RecordStream};
use claude_code_node::types::ResponseRecord;

/// What the mock does for one query call.
pub enum Reply {
    /// Yield these records, then end the stream.
    Records(Vec<Value>),
    /// Yield these records, then never finish.
    Hang(Vec<Value>),
    /// Yield these records, then fail the stream.
    FailAfter(Vec<Value>, NodeError),
    /// Fail before any stream is produced.
    Reject(NodeError),
}

/// A mock SDK that plays back queued replies and records every request.
#[derive(Default)]
pub struct MockSdk {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl MockSdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a reply; unqueued calls get [`success_records`].
    pub fn queue(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn parse(values: Vec<Value>) -> Vec<Result<ResponseRecord, NodeError>> {
    values
        .into_iter()
        .map(|value| Ok(serde_json::from_value(value).unwrap()))
        .collect()
}

#[async_trait]
impl AgentSdk for MockSdk {
    async fn query(&self, request: QueryRequest) -> Result<RecordStream, NodeError> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Records(success_records("done")));

        let stream: RecordStream = match reply {
            Reply::Records(values) => stream::iter(parse(values)).boxed(),
            Reply::Hang(values) => stream::iter(parse(values))
                .chain(stream::pending())
                .boxed(),
            Reply::FailAfter(values, err) => stream::iter(parse(values))
                .chain(stream::once(async move { Err(err) }))
                .boxed(),
            Reply::Reject(err) => return Err(err),
        };
        Ok(stream)
    }
}

/// Node wired to `sdk` with default parameter values.
pub fn node(sdk: &Arc<MockSdk>) -> ClaudeCodeNode {
    ClaudeCodeNode::new(sdk.clone())
}

/// Host over the given parameter objects.
pub fn host(items: Value) -> StaticHost {
    StaticHost::from_json(items).unwrap()
}

pub fn init_record() -> Value {
    json!({
        "type": "system",
        "subtype": "init",
        "session_id": "sess-1",
        "tools": ["Read", "Bash", "LS"]
    })
}

pub fn assistant_text(text: &str) -> Value {
    json!({
        "type": "assistant",
        "message": {"role": "assistant", "content": [{"type": "text", "text": text}]}
    })
}

pub fn assistant_tool_use(name: &str) -> Value {
    json!({
        "type": "assistant",
        "message": {
            "role": "assistant",
            "content": [{"type": "tool_use", "id": "toolu_1", "name": name, "input": {}}]
        }
    })
}

pub fn user_tool_result(text: &str) -> Value {
    json!({
        "type": "user",
        "message": {
            "role": "user",
            "content": [{"type": "tool_result", "tool_use_id": "toolu_1", "content": text}]
        }
    })
}

pub fn success_result(result: &str, duration_ms: u64) -> Value {
    json!({
        "type": "result",
        "subtype": "success",
        "result": result,
        "duration_ms": duration_ms
    })
}

/// init, one assistant text, a successful result.
pub fn success_records(result: &str) -> Vec<Value> {
    vec![
        init_record(),
        assistant_text("Looking at the files"),
        success_result(result, 120),
    ]
}

/// Walk a JSON value and collect the paths of null values.
pub fn null_paths(value: &Value) -> Vec<String> {
    fn walk(value: &Value, path: String, out: &mut Vec<String>) {
        match value {
            Value::Null => out.push(path),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    walk(item, format!("{path}[{i}]"), out);
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    walk(item, format!("{path}.{key}"), out);
                }
            }
            _ => {}
        }
    }
    let mut out = Vec::new();
    walk(value, "$".to_string(), &mut out);
    out
}

/// In-memory log sink for asserting on tracing output.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's tracing output here until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
