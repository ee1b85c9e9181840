use serde::Serialize;
use serde_json::{Map, Value};

/// Successful tool result: `{"success": true, "message", <payload fields>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ToolOutput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Map::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn with_warnings(mut self, warnings: impl IntoIterator<Item = Option<String>>) -> Self {
        self.warnings.extend(warnings.into_iter().flatten());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
