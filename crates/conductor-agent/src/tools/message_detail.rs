//! Turn lookup tool for memory-backed conversations.
//!
//! When a stretch of conversation has been replaced by a memory summary,
//! the agent can still recover any original turn by id through this tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use conductor_core::ToolDefinition;
use conductor_memory::MessageStore;

use crate::error::{AgentError, Result};
use crate::executor::Tool;

/// Loads the original text of a stored turn by its id.
pub struct LoadMessageDetailTool {
    store: Arc<MessageStore>,
    definition: ToolDefinition,
}

impl LoadMessageDetailTool {
    /// Create the tool over a shared store.
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self {
            store,
            definition: Self::schema(),
        }
    }

    /// The tool schema, usable without an instance.
    pub fn schema() -> ToolDefinition {
        ToolDefinition::new(
            "load_message_detail",
            "Load the original text of a stored message by its id, \
             for recovering details behind a memory summary.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "message_id": {
                        "type": "string",
                        "description": "Id of the message to load"
                    }
                },
                "required": ["message_id"]
            }),
        )
    }
}

#[async_trait]
impl Tool for LoadMessageDetailTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<String> {
        let message_id = args
            .get("message_id")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::InvalidArguments {
                tool_name: "load_message_detail".into(),
                message: "missing string argument: message_id".into(),
            })?;

        match self.store.message_by_id(message_id) {
            Some(turn) => Ok(format!("[{}] {}", turn.role, turn.content)),
            None => Ok(format!("No message found with id \"{}\".", message_id)),
        }
    }
}
