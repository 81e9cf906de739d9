//! Stored turn and memory record types.

use chrono::{DateTime, Utc};
use conductor_core::{Message, MessageRole, ToolCall};
use serde::{Deserialize, Serialize};

/// One stored unit of conversation with a unique id and timestamp.
///
/// Ids are unique and never mutated; the store's append order is the only
/// defined ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Unique identifier for this turn.
    pub id: String,

    /// Timestamp when the turn was recorded.
    pub timestamp: DateTime<Utc>,

    /// Role of the turn.
    pub role: MessageRole,

    /// Text content of the turn.
    pub content: String,

    /// Tool calls attached to an assistant turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Back-reference to the originating call for a tool turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl TurnRecord {
    /// Create a turn with a generated id and the current timestamp.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a turn with an explicit id (tests, replay).
    pub fn with_id(id: impl Into<String>, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now(),
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Capture a conversation message as a new stored turn.
    pub fn from_message(message: &Message) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role: message.role,
            content: message.content.clone(),
            tool_calls: message.tool_calls.clone(),
            tool_call_id: message.tool_call_id.clone(),
        }
    }

    /// Convert back to a conversation message, preserving every field.
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
            tool_calls: self.tool_calls.clone(),
            tool_call_id: self.tool_call_id.clone(),
        }
    }
}

/// Lifecycle state of a memory. Only active memories participate in
/// injection; a merged memory becomes inactive and points at its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryStatus {
    /// Participates in injection.
    Active,
    /// Superseded, kept for provenance.
    Inactive,
}

/// A compressed summary standing in for a set of stored turns.
///
/// Invariant: the `message_ids` of any two active memories are disjoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique identifier, `mem_`-prefixed.
    pub id: String,

    /// Compressed summary text.
    pub content: String,

    /// Ids of the turns this memory replaces, in store order.
    pub message_ids: Vec<String>,

    /// Lifecycle state.
    pub status: MemoryStatus,

    /// Timestamp when the memory was created.
    pub created_at: DateTime<Utc>,

    /// For inactive memories: the memory this one was merged into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_into_id: Option<String>,
}

impl MemoryRecord {
    /// Create a new active memory with a generated id.
    pub fn new(content: impl Into<String>, message_ids: Vec<String>) -> Self {
        Self {
            id: format!("mem_{}", uuid::Uuid::new_v4().simple()),
            content: content.into(),
            message_ids,
            status: MemoryStatus::Active,
            created_at: Utc::now(),
            merged_into_id: None,
        }
    }

    /// Create a new active memory with an explicit id.
    pub fn with_id(
        id: impl Into<String>,
        content: impl Into<String>,
        message_ids: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            message_ids,
            status: MemoryStatus::Active,
            created_at: Utc::now(),
            merged_into_id: None,
        }
    }

    /// Check whether this memory participates in injection.
    pub fn is_active(&self) -> bool {
        self.status == MemoryStatus::Active
    }

    /// Check whether this memory covers the given turn id.
    pub fn covers(&self, turn_id: &str) -> bool {
        self.message_ids.iter().any(|id| id == turn_id)
    }
}
