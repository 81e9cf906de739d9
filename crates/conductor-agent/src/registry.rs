//! Static agent directory.
//!
//! The registry is built once at startup and handed to the runner as an
//! explicit object. Lookup is by agent id or by delegate-tool name; the
//! delegate toolset visible to coordinator- and manager-level agents is
//! flat across every registered manager and worker.

use conductor_core::ToolDefinition;

use crate::agent::{AgentDef, AgentLevel};
use crate::error::{AgentError, Result};

/// Directory of agent definitions forming the delegation tree.
///
/// Registration order is preserved so the toolset advertised to the model
/// is deterministic.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: Vec<AgentDef>,
}

impl AgentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent definition. Duplicate ids and duplicate
    /// delegate-tool names are configuration errors.
    pub fn register(&mut self, agent: AgentDef) -> Result<()> {
        if self.get(&agent.id).is_some() {
            return Err(AgentError::Configuration(format!(
                "duplicate agent id: {}",
                agent.id
            )));
        }
        if self
            .agents
            .iter()
            .any(|a| a.delegate_tool.name == agent.delegate_tool.name)
        {
            return Err(AgentError::Configuration(format!(
                "duplicate delegate tool name: {}",
                agent.delegate_tool.name
            )));
        }
        self.agents.push(agent);
        Ok(())
    }

    /// Look up an agent by id.
    pub fn get(&self, id: &str) -> Option<&AgentDef> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// All registered agents, in registration order.
    pub fn agents(&self) -> &[AgentDef] {
        &self.agents
    }

    /// Declared children of the given agent, skipping unknown ids.
    pub fn children_of(&self, parent_id: &str) -> Vec<&AgentDef> {
        match self.get(parent_id) {
            Some(parent) => parent
                .children
                .iter()
                .filter_map(|child_id| self.get(child_id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// The first registered coordinator, if any.
    pub fn coordinator(&self) -> Option<&AgentDef> {
        self.agents
            .iter()
            .find(|a| a.level == AgentLevel::Coordinator)
    }

    /// Delegate schemas of every manager and worker, in registration
    /// order. This is the toolset a delegating agent sees.
    pub fn delegate_tools(&self) -> Vec<ToolDefinition> {
        self.agents
            .iter()
            .filter(|a| a.level != AgentLevel::Coordinator)
            .map(|a| a.delegate_tool.clone())
            .collect()
    }

    /// Resolve a delegate-tool name to the agent it invokes.
    pub fn agent_for_delegate_tool(&self, tool_name: &str) -> Option<&AgentDef> {
        self.agents
            .iter()
            .filter(|a| a.level != AgentLevel::Coordinator)
            .find(|a| a.delegate_tool.name == tool_name)
    }

    /// Validate the registry: every parent and child reference must
    /// resolve, and parent links must not form a cycle.
    pub fn validate(&self) -> Result<()> {
        for agent in &self.agents {
            if let Some(parent_id) = &agent.parent_id {
                if self.get(parent_id).is_none() {
                    return Err(AgentError::Configuration(format!(
                        "agent {} references unknown parent {}",
                        agent.id, parent_id
                    )));
                }
            }
            for child_id in &agent.children {
                if self.get(child_id).is_none() {
                    return Err(AgentError::Configuration(format!(
                        "agent {} references unknown child {}",
                        agent.id, child_id
                    )));
                }
            }
        }

        // Walk parent links; a chain longer than the registry is a cycle.
        for agent in &self.agents {
            let mut steps = 0;
            let mut current = agent;
            while let Some(parent_id) = &current.parent_id {
                steps += 1;
                if steps > self.agents.len() {
                    return Err(AgentError::Configuration(format!(
                        "parent links form a cycle involving agent {}",
                        agent.id
                    )));
                }
                match self.get(parent_id) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }

        Ok(())
    }
}
