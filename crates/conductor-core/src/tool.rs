//! Tool call, schema, and result types.
//!
//! Tool dispatch is name-based at the wire level: the model requests a tool
//! by name with a JSON-encoded argument blob, and receives a plain string
//! result. Argument parsing is deferred to dispatch time so that a
//! malformed blob becomes a per-call failure rather than a dropped call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A model's request to execute a named tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call, echoed back in the result message.
    pub id: String,

    /// Name of the tool to execute.
    pub name: String,

    /// JSON-encoded argument object, kept verbatim as received.
    pub arguments: String,
}

impl ToolCall {
    /// Create a tool call with a generated id.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            arguments: arguments.to_string(),
        }
    }

    /// Create a tool call with an explicit id.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.to_string(),
        }
    }

    /// Create a tool call from a raw argument blob, without re-encoding.
    pub fn from_raw(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the argument blob into a string-keyed map.
    ///
    /// An empty blob parses as an empty object. Invalid JSON or a
    /// non-object value is an error for the dispatcher to report.
    pub fn parse_arguments(&self) -> serde_json::Result<serde_json::Map<String, Value>> {
        let trimmed = self.arguments.trim();
        if trimmed.is_empty() {
            return Ok(serde_json::Map::new());
        }
        let value: Value = serde_json::from_str(trimmed)?;
        serde_json::from_value(value)
    }
}

/// A tool schema advertised to the model.
///
/// `parameters` follows the JSON Schema object shape expected by
/// chat-completion APIs: `{"type": "object", "properties": ..., "required": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool.
    pub name: String,

    /// Description of what the tool does.
    pub description: String,

    /// JSON Schema for the tool's parameters.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Create a definition for a tool that takes no parameters.
    pub fn no_params(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(
            name,
            description,
            serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        )
    }
}

/// The outcome of executing one tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the call this result answers.
    pub tool_call_id: String,

    /// Result text returned to the model.
    pub content: String,

    /// Whether the execution failed.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result.
    pub fn success(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create a failed result.
    pub fn error(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_generated_id() {
        let call = ToolCall::new("search", json!({"query": "rust"}));

        assert!(call.id.starts_with("call_"));
        assert_eq!(call.name, "search");
    }

    #[test]
    fn test_tool_call_ids_unique() {
        let a = ToolCall::new("t", json!({}));
        let b = ToolCall::new("t", json!({}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_parse_arguments_object() {
        let call = ToolCall::new("search", json!({"query": "rust", "limit": 3}));
        let args = call.parse_arguments().unwrap();

        assert_eq!(args.get("query"), Some(&json!("rust")));
        assert_eq!(args.get("limit"), Some(&json!(3)));
    }

    #[test]
    fn test_parse_arguments_empty_blob() {
        let call = ToolCall::from_raw("call-1", "noop", "");
        assert!(call.parse_arguments().unwrap().is_empty());

        let call = ToolCall::from_raw("call-2", "noop", "   ");
        assert!(call.parse_arguments().unwrap().is_empty());
    }

    #[test]
    fn test_parse_arguments_invalid_json() {
        let call = ToolCall::from_raw("call-1", "search", "{not json");
        assert!(call.parse_arguments().is_err());
    }

    #[test]
    fn test_parse_arguments_non_object() {
        let call = ToolCall::from_raw("call-1", "search", "[1, 2, 3]");
        assert!(call.parse_arguments().is_err());
    }

    #[test]
    fn test_tool_definition_no_params() {
        let def = ToolDefinition::no_params("ping", "Check liveness");

        assert_eq!(def.name, "ping");
        assert_eq!(def.parameters["type"], json!("object"));
        assert!(def.parameters["properties"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_tool_result_constructors() {
        let ok = ToolResult::success("call-1", "done");
        assert!(!ok.is_error);
        assert_eq!(ok.content, "done");

        let err = ToolResult::error("call-1", "boom");
        assert!(err.is_error);
        assert_eq!(err.tool_call_id, "call-1");
    }
}
