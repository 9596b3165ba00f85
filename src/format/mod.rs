//! Output shaping: maps aggregated state to one of the three item formats.
//!
//! Absent data is always an absent key; nothing here serializes a null.

use serde::Serialize;

use crate::aggregate::AggregatedState;
use crate::types::{ChatMessage, OutputFormat, RecordKind, ResponseRecord, Usage};

const NO_RESULT: &str = "No result available";

/// One item's output in the selected shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormattedOutput {
    Structured(StructuredOutput),
    Messages(MessagesOutput),
    Text(TextOutput),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextOutput {
    pub result: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesOutput {
    pub messages: Vec<RecordSummary>,
    pub message_count: usize,
}

/// A record reduced to its type and the payload fields it carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

impl From<&ResponseRecord> for RecordSummary {
    fn from(record: &ResponseRecord) -> Self {
        let (result, error) = match record {
            ResponseRecord::Result(terminal) => (terminal.result.clone(), terminal.error.clone()),
            _ => (None, None),
        };
        Self {
            kind: record.kind(),
            message: record.message().cloned(),
            result,
            error,
            subtype: record.subtype().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredOutput {
    pub summary: Summary,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    /// Raw records; debug mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ResponseRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub user_message_count: usize,
    pub assistant_message_count: usize,
    pub tool_use_count: usize,
    pub has_result: bool,
    pub tools_available: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_turns: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Build the output for `format`. `debug` only affects the structured shape.
pub fn format_output(state: &AggregatedState, format: OutputFormat, debug: bool) -> FormattedOutput {
    match format {
        OutputFormat::Text => FormattedOutput::Text(text(state)),
        OutputFormat::Messages => FormattedOutput::Messages(messages(state)),
        OutputFormat::Structured => FormattedOutput::Structured(structured(state, debug)),
    }
}

pub fn text(state: &AggregatedState) -> TextOutput {
    let terminal = state.result();
    TextOutput {
        result: terminal
            .and_then(|r| r.outcome_text())
            .unwrap_or(NO_RESULT)
            .to_string(),
        success: state.success(),
        duration_ms: terminal.and_then(|r| r.duration_ms),
        total_cost_usd: terminal.and_then(|r| r.total_cost_usd),
    }
}

pub fn messages(state: &AggregatedState) -> MessagesOutput {
    let messages: Vec<RecordSummary> = state.records().iter().map(RecordSummary::from).collect();
    MessagesOutput {
        message_count: messages.len(),
        messages,
    }
}

pub fn structured(state: &AggregatedState, debug: bool) -> StructuredOutput {
    let terminal = state.result();

    let (result, error) = match terminal {
        Some(r) if r.result.as_deref().is_some_and(|s| !s.is_empty()) => (r.result.clone(), None),
        Some(r) if r.error.as_deref().is_some_and(|s| !s.is_empty()) => (None, r.error.clone()),
        _ => (None, None),
    };

    let metrics = terminal.and_then(|r| {
        r.duration_ms.map(|duration_ms| Metrics {
            duration_ms,
            num_turns: r.num_turns,
            total_cost_usd: r.total_cost_usd,
            usage: r.usage.clone(),
        })
    });

    StructuredOutput {
        summary: Summary {
            user_message_count: state.user_message_count(),
            assistant_message_count: state.assistant_message_count(),
            tool_use_count: state.tool_use_count(),
            has_result: terminal.is_some(),
            tools_available: state.tools_available().to_vec(),
        },
        success: state.success(),
        result,
        error,
        metrics,
        messages: debug.then(|| state.records().to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::MessageAggregator;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn state(values: Vec<serde_json::Value>) -> AggregatedState {
        let mut aggregator = MessageAggregator::new(false);
        for value in values {
            aggregator.push(serde_json::from_value(value).unwrap());
        }
        aggregator.finish()
    }

    #[test]
    fn structured_error_only_when_result_missing() {
        let state = state(vec![json!({
            "type": "result",
            "subtype": "error_during_execution",
            "error": "tool crashed",
            "duration_ms": 5,
            "usage": {"input_tokens": 3, "output_tokens": 4}
        })]);
        let output = serde_json::to_value(structured(&state, false)).unwrap();
        assert_eq!(
            output,
            json!({
                "summary": {
                    "userMessageCount": 0,
                    "assistantMessageCount": 0,
                    "toolUseCount": 0,
                    "hasResult": true,
                    "toolsAvailable": []
                },
                "success": false,
                "error": "tool crashed",
                "metrics": {
                    "duration_ms": 5,
                    "usage": {"input_tokens": 3, "output_tokens": 4}
                }
            })
        );
    }

    #[test]
    fn summaries_keep_only_present_fields() {
        let state = state(vec![
            json!({"type": "system", "subtype": "init", "tools": []}),
            json!({"type": "user", "message": {"content": "hi"}}),
            json!({"type": "result", "subtype": "success", "result": "ok", "session_id": "s"}),
        ]);
        let output = serde_json::to_value(messages(&state)).unwrap();
        assert_eq!(
            output,
            json!({
                "messages": [
                    {"type": "system", "subtype": "init"},
                    {"type": "user", "message": {"content": "hi"}},
                    {"type": "result", "subtype": "success", "result": "ok"}
                ],
                "messageCount": 3
            })
        );
    }

    #[test]
    fn text_falls_back_to_error_text() {
        let state = state(vec![json!({
            "type": "result",
            "subtype": "error_max_turns",
            "error": "hit max turns",
            "total_cost_usd": 0.25
        })]);
        assert_eq!(
            serde_json::to_value(text(&state)).unwrap(),
            json!({"result": "hit max turns", "success": false, "total_cost_usd": 0.25})
        );
    }

    #[test]
    fn format_selector_picks_shape() {
        let state = state(vec![]);
        assert!(matches!(
            format_output(&state, OutputFormat::Text, true),
            FormattedOutput::Text(_)
        ));
        assert!(matches!(
            format_output(&state, OutputFormat::Messages, true),
            FormattedOutput::Messages(MessagesOutput { message_count: 0, .. })
        ));
        assert!(matches!(
            format_output(&state, OutputFormat::Structured, true),
            FormattedOutput::Structured(StructuredOutput { messages: Some(_), .. })
        ));
    }
}
