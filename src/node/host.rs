//! In-memory host backed by JSON parameter maps, one per item.

use serde_json::{Map, Value};

use super::NodeHost;
use crate::error::{NodeError, Result};

/// A [`NodeHost`] whose parameters are fixed up front.
///
/// Dotted names (`additionalOptions.debug`) resolve into nested objects.
#[derive(Debug, Clone)]
pub struct StaticHost {
    node_name: String,
    items: Vec<Map<String, Value>>,
    continue_on_fail: bool,
}

impl StaticHost {
    pub fn new(items: Vec<Map<String, Value>>) -> Self {
        Self {
            node_name: "Claude Code".to_string(),
            items,
            continue_on_fail: false,
        }
    }

    /// Build from a JSON array of parameter objects (or a single object).
    pub fn from_json(value: Value) -> Result<Self> {
        let items = match value {
            Value::Array(entries) => entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| match entry {
                    Value::Object(map) => Ok(map),
                    other => Err(NodeError::Validation(format!(
                        "item {index} must be a JSON object, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            Value::Object(map) => vec![map],
            other => {
                return Err(NodeError::Validation(format!(
                    "expected an object or an array of objects, got {other}"
                )))
            }
        };
        Ok(Self::new(items))
    }

    pub fn with_continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }

    pub fn with_node_name(mut self, name: impl Into<String>) -> Self {
        self.node_name = name.into();
        self
    }
}

impl NodeHost for StaticHost {
    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn parameter(&self, name: &str, item_index: usize) -> Option<Value> {
        let mut segments = name.split('.');
        let first = segments.next()?;
        let mut current = self.items.get(item_index)?.get(first)?;
        for segment in segments {
            current = current.get(segment)?;
        }
        (!current.is_null()).then(|| current.clone())
    }

    fn continue_on_fail(&self) -> bool {
        self.continue_on_fail
    }

    fn node_name(&self) -> &str {
        &self.node_name
    }
}
