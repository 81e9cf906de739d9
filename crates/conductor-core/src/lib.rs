//! Shared conversation primitives for the Conductor multi-agent system.
//!
//! This crate defines the types every other Conductor crate speaks:
//! conversation messages and roles, tool calls and their schemas, the
//! terminal marker that ends an agent loop, and the character-based token
//! estimate used for context budgeting.
//!
//! # Core Types
//!
//! - [`Message`]: one conversation turn (system/user/assistant/tool)
//! - [`MessageRole`]: the role of a turn
//! - [`ToolCall`]: a model's request to execute a named tool
//! - [`ToolDefinition`]: a tool schema advertised to the model
//! - [`ToolResult`]: the outcome of executing one tool call
//!
//! The crate performs no I/O and has no async surface.

pub mod marker;
pub mod message;
pub mod tool;

pub use marker::{
    contains_terminal_marker, estimate_tokens, strip_terminal_marker, TERMINAL_MARKER,
};
pub use message::{Message, MessageRole};
pub use tool::{ToolCall, ToolDefinition, ToolResult};
