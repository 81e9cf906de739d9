//! Safe shell execution tool for worker agents.
//!
//! Supports read commands (ls, cat, grep, find) and write-by-redirection;
//! delete operations are rejected up front by a blocklist. Execution is
//! bounded by a timeout and an output cap.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use conductor_core::ToolDefinition;

use crate::error::{AgentError, Result};
use crate::executor::Tool;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Command patterns that are never executed.
fn blocklist() -> &'static Vec<Regex> {
    static BLOCKLIST: OnceLock<Vec<Regex>> = OnceLock::new();
    BLOCKLIST.get_or_init(|| {
        [
            r"(?i)\brm\b",
            r"(?i)\bdel\b",
            r"(?i)\bdelete\b",
            r"(?i)\btruncate\b",
            r"(?i)\bunlink\b",
            r"(?i)\brmdir\b",
            r"(?i)\bremove\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("blocklist pattern is valid"))
        .collect()
    })
}

fn is_allowed_command(command: &str) -> bool {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return false;
    }
    !blocklist().iter().any(|pattern| pattern.is_match(trimmed))
}

/// Shell tool with a delete-operation blocklist.
pub struct SafeShellTool {
    definition: ToolDefinition,
}

impl Default for SafeShellTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SafeShellTool {
    /// Create the tool.
    pub fn new() -> Self {
        Self {
            definition: Self::schema(),
        }
    }

    /// The tool schema, usable without an instance (e.g. when declaring an
    /// agent's toolset).
    pub fn schema() -> ToolDefinition {
        ToolDefinition::new(
            "run_safe_shell",
            "Run a shell command locally. Reads: ls, cat, head, tail, grep, find. \
             Writes: echo \"content\" > file (overwrite) or >> file (append). \
             Delete operations such as rm, del, rmdir are rejected.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "Shell command to run (delete operations are rejected)"
                    }
                },
                "required": ["command"]
            }),
        )
    }
}

#[async_trait]
impl Tool for SafeShellTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<String> {
        let command = args
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::InvalidArguments {
                tool_name: "run_safe_shell".into(),
                message: "missing string argument: command".into(),
            })?;

        if !is_allowed_command(command) {
            return Ok(
                "Error: command rejected. Delete operations (rm, del, rmdir, ...) are not allowed."
                    .to_string(),
            );
        }

        debug!(command, "running shell command");

        let child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .output();

        let output = tokio::time::timeout(COMMAND_TIMEOUT, child)
            .await
            .map_err(|_| AgentError::ToolExecution {
                tool_name: "run_safe_shell".into(),
                message: format!("timed out after {}s", COMMAND_TIMEOUT.as_secs()),
            })?
            .map_err(|e| AgentError::ToolExecution {
                tool_name: "run_safe_shell".into(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AgentError::ToolExecution {
                tool_name: "run_safe_shell".into(),
                message: format!("exit status {}: {}", output.status, stderr.trim()),
            });
        }

        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.len() > MAX_OUTPUT_BYTES {
            stdout.truncate(MAX_OUTPUT_BYTES);
        }

        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            Ok("(no output)".to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }
}
