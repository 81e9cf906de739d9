//! Error types for the orchestration engine.

use thiserror::Error;

/// Errors raised by agent orchestration.
///
/// Tool-internal failures do not appear here: the executor converts them
/// into result strings visible to the model, at per-call granularity.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration error (unknown agent, bad registry, missing key).
    /// Fatal, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Model invocation failed (transport, auth, non-2xx status).
    /// Fatal to the current loop invocation.
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),

    /// Model response could not be interpreted.
    #[error("failed to parse response: {0}")]
    ResponseParse(String),

    /// Tool execution failed. Callers convert this into a result string.
    #[error("tool execution failed: {tool_name}: {message}")]
    ToolExecution {
        /// Name of the tool that failed.
        tool_name: String,
        /// Error message.
        message: String,
    },

    /// Invalid tool arguments.
    #[error("invalid tool arguments for {tool_name}: {message}")]
    InvalidArguments {
        /// Name of the tool.
        tool_name: String,
        /// Error message.
        message: String,
    },

    /// Maximum iterations exceeded in the agent loop.
    #[error("maximum iterations ({0}) exceeded in agent loop")]
    MaxIterationsExceeded(u32),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
