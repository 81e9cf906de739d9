//! Agent definitions.
//!
//! An [`AgentDef`] describes one bounded conversational role: its place in
//! the delegation hierarchy, the system prompt that seeds its
//! conversations, the delegate schema its parent invokes it through, and
//! the primitive tools it may call itself.

use serde::{Deserialize, Serialize};

use conductor_core::ToolDefinition;

/// Hierarchy level of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentLevel {
    /// Top-level agent that owns the user-facing conversation.
    Coordinator,
    /// Mid-level agent that breaks a task down and delegates further.
    Manager,
    /// Leaf agent that executes primitive tools directly.
    Worker,
}

impl std::fmt::Display for AgentLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coordinator => write!(f, "coordinator"),
            Self::Manager => write!(f, "manager"),
            Self::Worker => write!(f, "worker"),
        }
    }
}

/// Static definition of one agent. Built at startup, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDef {
    /// Unique agent id.
    pub id: String,

    /// Hierarchy level.
    pub level: AgentLevel,

    /// Parent agent id, absent for the coordinator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Declared child agent ids. Structural documentation of the tree;
    /// delegation visibility is flat across all managers and workers.
    #[serde(default)]
    pub children: Vec<String>,

    /// System prompt seeding every conversation of this agent.
    pub system_prompt: String,

    /// Tool schema a parent uses to delegate to this agent.
    pub delegate_tool: ToolDefinition,

    /// Argument key carrying the task text in the delegate schema.
    pub delegate_input_key: String,

    /// Primitive tools this agent may call itself (workers only).
    #[serde(default)]
    pub worker_tools: Vec<ToolDefinition>,
}

impl AgentDef {
    /// Create an agent definition with no links or worker tools.
    pub fn new(
        id: impl Into<String>,
        level: AgentLevel,
        system_prompt: impl Into<String>,
        delegate_tool: ToolDefinition,
        delegate_input_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            level,
            parent_id: None,
            children: Vec::new(),
            system_prompt: system_prompt.into(),
            delegate_tool,
            delegate_input_key: delegate_input_key.into(),
            worker_tools: Vec::new(),
        }
    }

    /// Set the parent link.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Set the declared children.
    pub fn with_children(mut self, children: Vec<String>) -> Self {
        self.children = children;
        self
    }

    /// Set the primitive tools.
    pub fn with_worker_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.worker_tools = tools;
        self
    }

    /// Check whether this agent delegates rather than calling tools.
    pub fn is_delegating(&self) -> bool {
        matches!(self.level, AgentLevel::Coordinator | AgentLevel::Manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delegate_tool(name: &str) -> ToolDefinition {
        ToolDefinition::new(
            name,
            "Delegate a task",
            serde_json::json!({
                "type": "object",
                "properties": {"task": {"type": "string", "description": "Task description"}},
                "required": ["task"]
            }),
        )
    }

    #[test]
    fn test_level_display() {
        assert_eq!(AgentLevel::Coordinator.to_string(), "coordinator");
        assert_eq!(AgentLevel::Manager.to_string(), "manager");
        assert_eq!(AgentLevel::Worker.to_string(), "worker");
    }

    #[test]
    fn test_agent_def_builder() {
        let def = AgentDef::new(
            "scanner",
            AgentLevel::Worker,
            "You scan directories.",
            delegate_tool("delegate_to_scanner"),
            "directory",
        )
        .with_parent("analysis-manager")
        .with_worker_tools(vec![ToolDefinition::no_params("ls", "List files")]);

        assert_eq!(def.id, "scanner");
        assert_eq!(def.parent_id.as_deref(), Some("analysis-manager"));
        assert_eq!(def.delegate_input_key, "directory");
        assert_eq!(def.worker_tools.len(), 1);
        assert!(!def.is_delegating());
    }

    #[test]
    fn test_is_delegating() {
        let coordinator = AgentDef::new(
            "coordinator",
            AgentLevel::Coordinator,
            "p",
            delegate_tool("delegate_to_coordinator"),
            "task",
        );
        assert!(coordinator.is_delegating());

        let manager = AgentDef::new(
            "manager",
            AgentLevel::Manager,
            "p",
            delegate_tool("delegate_to_manager"),
            "task",
        );
        assert!(manager.is_delegating());
    }
}
