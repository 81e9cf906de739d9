//! Name-based tool dispatch.
//!
//! The executor turns a batch of tool-call requests into a batch of result
//! records. Every failure below the batch boundary is converted into a
//! result string the model can read: invalid argument JSON, tool-internal
//! errors, and unknown names all produce strings, never propagated errors.
//! Calls within a batch run strictly sequentially, in request order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use conductor_core::{ToolCall, ToolDefinition, ToolResult};

use crate::error::Result;

/// A primitive tool: a named operation taking string-keyed arguments and
/// returning a string result.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema advertised to the model.
    fn definition(&self) -> &ToolDefinition;

    /// Execute with parsed arguments. Errors are caught per-call by the
    /// executor and surfaced as result strings.
    async fn execute(&self, args: &Map<String, Value>) -> Result<String>;
}

/// Registry of tool implementations keyed by name.
#[derive(Default)]
pub struct ToolExecutor {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolExecutor {
    /// Create an empty executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its definition name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.definition().name.clone(), tool);
    }

    /// Check whether a tool is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Dispatch one call, converting every failure into a result string.
    pub async fn dispatch(&self, call: &ToolCall) -> String {
        let tool = match self.tools.get(&call.name) {
            Some(tool) => tool,
            None => return format!("Unknown tool: {}", call.name),
        };

        let args = match call.parse_arguments() {
            Ok(args) => args,
            Err(e) => return format!("Error: invalid arguments for {}: {}", call.name, e),
        };

        debug!(tool = %call.name, call_id = %call.id, "dispatching tool call");

        match tool.execute(&args).await {
            Ok(result) => result,
            Err(e) => format!("Error: {}", e),
        }
    }

    /// Dispatch a batch sequentially, preserving request order in the
    /// returned results.
    pub async fn dispatch_batch(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let content = self.dispatch(call).await;
            results.push(ToolResult::success(&call.id, content));
        }
        results
    }
}
