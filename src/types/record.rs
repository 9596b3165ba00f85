//! Response records streamed by the agent SDK.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use super::usage::Usage;

/// One event emitted by the agent during a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseRecord {
    System(SystemRecord),
    User(ChatRecord),
    Assistant(ChatRecord),
    Result(ResultRecord),
}

/// Record discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
    System,
    User,
    Assistant,
    Result,
}

impl ResponseRecord {
    /// Parse one line of `stream-json` output.
    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::System(_) => RecordKind::System,
            Self::User(_) => RecordKind::User,
            Self::Assistant(_) => RecordKind::Assistant,
            Self::Result(_) => RecordKind::Result,
        }
    }

    pub fn subtype(&self) -> Option<&str> {
        match self {
            Self::System(system) => system.subtype.as_deref(),
            Self::Result(result) => Some(result.subtype.as_str()),
            Self::User(_) | Self::Assistant(_) => None,
        }
    }

    pub fn message(&self) -> Option<&ChatMessage> {
        match self {
            Self::User(chat) | Self::Assistant(chat) => Some(&chat.message),
            Self::System(_) | Self::Result(_) => None,
        }
    }
}

/// `system` records; `init` carries the tool inventory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(flatten, deserialize_with = "non_null::map")]
    pub extra: Map<String, Value>,
}

impl SystemRecord {
    pub fn is_init(&self) -> bool {
        self.subtype.as_deref() == Some("init")
    }
}

/// `user` and `assistant` records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub message: ChatMessage,
    #[serde(flatten, deserialize_with = "non_null::map")]
    pub extra: Map<String, Value>,
}

/// The model-level message wrapped by a chat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: MessageContent,
    #[serde(flatten, deserialize_with = "non_null::map")]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    pub fn first_block(&self) -> Option<&ContentBlock> {
        match &self.content {
            MessageContent::Blocks(blocks) => blocks.first(),
            MessageContent::Text(_) => None,
        }
    }

    /// Text of the first `text` block, if any.
    pub fn first_text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Blocks(blocks) => blocks.iter().find_map(ContentBlock::text),
        }
    }
}

/// Message content: a bare string (user prompts) or ordered blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// One content block. Types without a modelled shape are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentBlock {
    Known(KnownBlock),
    Other(#[serde(deserialize_with = "non_null::value")] Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KnownBlock {
    Text {
        text: String,
        #[serde(flatten, deserialize_with = "non_null::map")]
        extra: Map<String, Value>,
    },
    ToolUse {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        #[serde(
            default,
            deserialize_with = "non_null::value",
            skip_serializing_if = "Value::is_null"
        )]
        input: Value,
        #[serde(flatten, deserialize_with = "non_null::map")]
        extra: Map<String, Value>,
    },
    ToolResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_use_id: Option<String>,
        #[serde(
            default,
            deserialize_with = "non_null::value",
            skip_serializing_if = "Value::is_null"
        )]
        content: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
        #[serde(flatten, deserialize_with = "non_null::map")]
        extra: Map<String, Value>,
    },
    Thinking {
        thinking: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
        #[serde(flatten, deserialize_with = "non_null::map")]
        extra: Map<String, Value>,
    },
}

impl ContentBlock {
    /// Text of a `text` block.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Known(KnownBlock::Text { text, .. }) => Some(text),
            _ => None,
        }
    }

    /// Tool name of a `tool_use` block.
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::Known(KnownBlock::ToolUse { name, .. }) => Some(name),
            _ => None,
        }
    }

    pub fn is_tool_use(&self) -> bool {
        self.tool_name().is_some()
    }

    /// The block's `type` tag.
    pub fn block_type(&self) -> Option<&str> {
        match self {
            Self::Known(KnownBlock::Text { .. }) => Some("text"),
            Self::Known(KnownBlock::ToolUse { .. }) => Some("tool_use"),
            Self::Known(KnownBlock::ToolResult { .. }) => Some("tool_result"),
            Self::Known(KnownBlock::Thinking { .. }) => Some("thinking"),
            Self::Other(raw) => raw.get("type").and_then(Value::as_str),
        }
    }
}

/// Terminal `result` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub subtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_turns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(flatten, deserialize_with = "non_null::map")]
    pub extra: Map<String, Value>,
}

impl ResultRecord {
    pub fn is_success(&self) -> bool {
        self.subtype == "success"
    }

    /// `result` text, falling back to `error`. Empty strings count as absent.
    pub fn outcome_text(&self) -> Option<&str> {
        non_empty(self.result.as_deref()).or_else(|| non_empty(self.error.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Deserializers that drop null-valued object keys at any depth.
pub(crate) mod non_null {
    use serde::{Deserialize, Deserializer};
    use serde_json::{Map, Value};

    pub fn map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut map = Map::deserialize(deserializer)?;
        prune_map(&mut map);
        Ok(map)
    }

    pub fn value<'de, D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut value = Value::deserialize(deserializer)?;
        prune(&mut value);
        Ok(value)
    }

    fn prune(value: &mut Value) {
        match value {
            Value::Object(map) => prune_map(map),
            Value::Array(items) => items.iter_mut().for_each(prune),
            _ => {}
        }
    }

    fn prune_map(map: &mut Map<String, Value>) {
        map.retain(|_, value| !value.is_null());
        map.values_mut().for_each(prune);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_init_record_and_keeps_extra_fields() {
        let line = r#"{"type":"system","subtype":"init","session_id":"abc","tools":["Read","Bash"],"model":"claude-sonnet-4"}"#;
        let record = ResponseRecord::from_json_line(line).unwrap();
        let ResponseRecord::System(system) = &record else {
            panic!("expected system record, got {record:?}");
        };
        assert!(system.is_init());
        assert_eq!(
            system.tools.as_deref(),
            Some(&["Read".to_string(), "Bash".to_string()][..])
        );
        assert_eq!(system.extra.get("session_id"), Some(&json!("abc")));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back, serde_json::from_str::<Value>(line).unwrap());
    }

    #[test]
    fn parses_assistant_tool_use_block() {
        let record = ResponseRecord::from_json_line(
            r#"{"type":"assistant","message":{"role":"assistant","content":[{"type":"tool_use","id":"t1","name":"Bash","input":{"command":"ls"}}]},"session_id":"abc"}"#,
        )
        .unwrap();
        assert_eq!(record.kind(), RecordKind::Assistant);
        let block = record.message().and_then(ChatMessage::first_block).unwrap();
        assert_eq!(block.tool_name(), Some("Bash"));
        assert!(block.is_tool_use());
    }

    #[test]
    fn user_prompt_may_be_plain_string() {
        let record = ResponseRecord::from_json_line(
            r#"{"type":"user","message":{"role":"user","content":"hello"}}"#,
        )
        .unwrap();
        let message = record.message().unwrap();
        assert_eq!(message.first_text(), Some("hello"));
        assert!(message.first_block().is_none());
    }

    #[test]
    fn unknown_block_types_do_not_fail_parsing() {
        let record = ResponseRecord::from_json_line(
            r#"{"type":"assistant","message":{"content":[{"type":"server_tool_use","name":"x"},{"type":"text","text":"hi"}]}}"#,
        )
        .unwrap();
        let message = record.message().unwrap();
        let first = message.first_block().unwrap();
        assert!(matches!(first, ContentBlock::Other(_)));
        assert_eq!(first.block_type(), Some("server_tool_use"));
        assert_eq!(message.first_text(), Some("hi"));
    }

    #[test]
    fn assistant_blocks_reserialize_without_loss() {
        let raw = json!({
            "type": "assistant",
            "message": {
                "id": "msg_01",
                "role": "assistant",
                "model": "claude-sonnet-4",
                "content": [
                    {"type": "redacted_thinking", "data": "abc"},
                    {"type": "thinking", "thinking": "hmm", "signature": "sig"},
                    {
                        "type": "text",
                        "text": "hi",
                        "citations": [{"type": "char_location", "cited_text": "x"}]
                    },
                    {"type": "tool_use", "id": "t", "name": "Bash", "input": {}, "caller": "x"},
                    {"type": "image", "source": {"type": "base64", "data": "AAAA"}}
                ],
                "usage": {"input_tokens": 4, "output_tokens": 9}
            },
            "session_id": "abc"
        });
        let record: ResponseRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn null_fields_are_dropped_at_any_depth() {
        let record: ResponseRecord = serde_json::from_value(json!({
            "type": "assistant",
            "parent_tool_use_id": null,
            "message": {
                "role": "assistant",
                "stop_reason": null,
                "stop_sequence": null,
                "usage": {"input_tokens": 3, "server_tool_use": null},
                "content": [
                    {"type": "tool_use", "id": "t", "name": "Read", "input": {"path": "a", "limit": null}},
                    {"type": "web_search_tool_result", "content": null, "tool_use_id": "w"}
                ]
            }
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "type": "assistant",
                "message": {
                    "role": "assistant",
                    "usage": {"input_tokens": 3},
                    "content": [
                        {"type": "tool_use", "id": "t", "name": "Read", "input": {"path": "a"}},
                        {"type": "web_search_tool_result", "tool_use_id": "w"}
                    ]
                }
            })
        );
    }

    #[test]
    fn result_outcome_treats_empty_result_as_absent() {
        let record: ResultRecord = serde_json::from_value(json!({
            "subtype": "error_during_execution",
            "result": "",
            "error": "tool crashed"
        }))
        .unwrap();
        assert!(!record.is_success());
        assert_eq!(record.outcome_text(), Some("tool crashed"));
    }
}
