//! Built-in agent catalog: a technical-debt analysis hierarchy.
//!
//! Coordinator on top, two managers below it (analysis, reporting), four
//! workers at the leaves. Scanner and analyzer carry the safe-shell tool;
//! assessor and reporter work from the text they are handed.

use conductor_agent::tools::{LoadMessageDetailTool, SafeShellTool};
use conductor_agent::{AgentDef, AgentLevel, AgentRegistry, Result};
use conductor_core::ToolDefinition;
use serde_json::json;

/// Build and validate the default delegation hierarchy.
pub fn default_registry() -> Result<AgentRegistry> {
    let mut registry = AgentRegistry::new();

    registry.register(coordinator())?;
    registry.register(analysis_manager())?;
    registry.register(report_manager())?;
    registry.register(scanner())?;
    registry.register(analyzer())?;
    registry.register(assessor())?;
    registry.register(reporter())?;

    registry.validate()?;
    Ok(registry)
}

fn coordinator() -> AgentDef {
    AgentDef::new(
        "coordinator",
        AgentLevel::Coordinator,
        "You are the top-level coordinator of a technical-debt analysis system.\n\
         \n\
         Your responsibilities:\n\
         1. Understand the user's analysis request\n\
         2. Delegate the analysis to the analysis manager\n\
         3. Consolidate the results into a final report\n\
         4. Involve the report manager where a formatted report is needed\n\
         \n\
         Workflow:\n\
         1. The user states an analysis request\n\
         2. Call the analysis manager to run the analysis\n\
         3. With the results in hand, call the report manager to produce the report\n\
         4. Return the final report to the user\n\
         \n\
         End your reply with [STOP] when you are finished.",
        ToolDefinition::new(
            "delegate_to_coordinator",
            "Internal delegation tool of the top-level coordinator",
            json!({
                "type": "object",
                "properties": {
                    "task": {"type": "string", "description": "Task description"},
                    "options": {"type": "object", "description": "Optional parameters"}
                },
                "required": ["task"]
            }),
        ),
        "task",
    )
    .with_children(vec!["analysis-manager".into(), "report-manager".into()])
}

fn analysis_manager() -> AgentDef {
    AgentDef::new(
        "analysis-manager",
        AgentLevel::Manager,
        "You are the code analysis manager, responsible for the whole \
         technical-debt analysis pipeline.\n\
         \n\
         Your responsibilities:\n\
         1. Have the scanner find the target projects\n\
         2. Have the analyzer identify technical debt in each project\n\
         3. Have the assessor rank the findings by severity\n\
         4. Summarize everything for the coordinator\n\
         \n\
         Working mode:\n\
         1. First delegate to the scanner to find target projects\n\
         2. Then delegate to the analyzer for each project\n\
         3. Finally delegate to the assessor to rank all findings\n\
         4. Return the consolidated result\n\
         \n\
         End your reply with [STOP] when you are finished.",
        ToolDefinition::new(
            "delegate_to_analysis_manager",
            "Delegate to the analysis manager, who runs scanning, code analysis and severity assessment",
            json!({
                "type": "object",
                "properties": {
                    "task": {"type": "string", "description": "Analysis task description"},
                    "options": {"type": "object", "description": "Optional parameters (JSON object)"}
                },
                "required": ["task"]
            }),
        ),
        "task",
    )
    .with_parent("coordinator")
    .with_children(vec!["scanner".into(), "analyzer".into(), "assessor".into()])
}

fn report_manager() -> AgentDef {
    AgentDef::new(
        "report-manager",
        AgentLevel::Manager,
        "You are the report manager, responsible for turning analysis results \
         into a well-structured report.\n\
         \n\
         Your responsibilities:\n\
         1. Receive the analysis manager's consolidated results\n\
         2. Delegate to the reporter to produce a structured Markdown report\n\
         3. Optionally tidy up the formatting\n\
         \n\
         End your reply with [STOP] when you are finished.",
        ToolDefinition::new(
            "delegate_to_report_manager",
            "Delegate to the report manager to produce the technical-debt report",
            json!({
                "type": "object",
                "properties": {
                    "task": {"type": "string", "description": "Report task description"},
                    "options": {"type": "object", "description": "Optional parameters (JSON object)"}
                },
                "required": ["task"]
            }),
        ),
        "task",
    )
    .with_parent("coordinator")
    .with_children(vec!["reporter".into()])
}

fn scanner() -> AgentDef {
    AgentDef::new(
        "scanner",
        AgentLevel::Worker,
        "You are a file scanning specialist who searches directories for \
         target projects.\n\
         \n\
         You may only use these tools:\n\
         - run_safe_shell: run safe shell commands (ls, find, grep, ...)\n\
         \n\
         Example tasks:\n\
         1. Scan a directory for projects containing a Cargo.toml\n\
         2. Find files containing a given keyword\n\
         3. List a directory tree\n\
         \n\
         Notes:\n\
         - Read-only work, never delete anything\n\
         - Return a clear project list\n\
         \n\
         End your reply with [STOP] when you are finished.",
        ToolDefinition::new(
            "delegate_to_scanner",
            "Delegate to the file scanning specialist to scan a directory and identify projects",
            json!({
                "type": "object",
                "properties": {
                    "directory": {"type": "string", "description": "Directory path to scan"},
                    "filter": {"type": "string", "description": "Filter condition (e.g. file name contains)"}
                },
                "required": ["directory"]
            }),
        ),
        "directory",
    )
    .with_parent("analysis-manager")
    .with_worker_tools(vec![SafeShellTool::schema()])
}

fn analyzer() -> AgentDef {
    AgentDef::new(
        "analyzer",
        AgentLevel::Worker,
        "You are a code analysis specialist who examines a single project for \
         technical debt.\n\
         \n\
         You may only use these tools:\n\
         - run_safe_shell: run safe shell commands\n\
         \n\
         Analysis dimensions:\n\
         1. Code complexity (line and file counts)\n\
         2. Potential problems (outdated dependencies, hard-coded values, missing docs)\n\
         3. Code structure (directory depth, module layout)\n\
         \n\
         Workflow:\n\
         1. Enter the project directory\n\
         2. Gather code statistics\n\
         3. Inspect key files (manifests, configuration)\n\
         4. Identify likely technical debt\n\
         5. Classify by severity: high/medium/low\n\
         \n\
         End your reply with [STOP] when you are finished.",
        ToolDefinition::new(
            "delegate_to_analyzer",
            "Delegate to the code analysis specialist to analyze one project's technical debt",
            json!({
                "type": "object",
                "properties": {
                    "project": {"type": "string", "description": "Project path"},
                    "focus": {"type": "string", "description": "Analysis focus (tech-debt, security, quality)"}
                },
                "required": ["project"]
            }),
        ),
        "project",
    )
    .with_parent("analysis-manager")
    .with_worker_tools(vec![SafeShellTool::schema()])
}

fn assessor() -> AgentDef {
    AgentDef::new(
        "assessor",
        AgentLevel::Worker,
        "You are a severity assessment specialist who ranks technical debt \
         across multiple projects.\n\
         \n\
         Your responsibilities:\n\
         1. Receive the analysis results of several projects\n\
         2. Weigh high-severity counts, code size, and long-standing debt\n\
         3. Produce a list ordered by severity\n\
         \n\
         Assessment criteria:\n\
         - More high-severity findings mean higher overall severity\n\
         - The same finding weighs more in a larger codebase\n\
         - Long-unfixed debt raises severity\n\
         \n\
         Output format:\n\
         1. Overall ranking\n\
         2. A severity grade per project\n\
         3. A summary of the key findings\n\
         \n\
         End your reply with [STOP] when you are finished.",
        ToolDefinition::new(
            "delegate_to_assessor",
            "Delegate to the severity assessment specialist to rank technical debt",
            json!({
                "type": "object",
                "properties": {
                    "projects": {"type": "string", "description": "Project analysis results as JSON"},
                    "sort_by": {"type": "string", "description": "Sort criterion (severity, count, ratio)"}
                },
                "required": ["projects"]
            }),
        ),
        "projects",
    )
    .with_parent("analysis-manager")
}

fn reporter() -> AgentDef {
    AgentDef::new(
        "reporter",
        AgentLevel::Worker,
        "You are a report generation specialist who turns analysis data into a \
         structured Markdown report.\n\
         \n\
         Report structure:\n\
         1. Title and executive summary\n\
         2. Findings ordered by severity\n\
         3. Details and remediation advice per finding\n\
         4. Overall grade and suggested priorities\n\
         \n\
         Formatting rules:\n\
         - Use Markdown syntax\n\
         - Use tables to present data clearly\n\
         - Keep recommendations concrete and actionable\n\
         \n\
         End your reply with [STOP] when you are finished.",
        ToolDefinition::new(
            "delegate_to_reporter",
            "Delegate to the report generation specialist for a Markdown technical-debt report",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Report title"},
                    "content": {"type": "string", "description": "Analysis findings"},
                    "format": {"type": "string", "description": "Output format (markdown, json)"}
                },
                "required": ["title", "content"]
            }),
        ),
        "content",
    )
    .with_parent("report-manager")
}

/// System prompt for the memory-backed chat coordinator.
pub fn chat_system_prompt() -> &'static str {
    "You are a conversation assistant with memory. Your context contains \
     memory summaries standing in for older conversation, plus the most \
     recent messages.\n\
     \n\
     When you need the details behind a summarized span, use the \
     load_message_detail tool with the message id to fetch the original \
     text.\n\
     There is no need to end replies with [STOP]."
}

/// Tool schemas visible to the chat coordinator.
pub fn chat_tools() -> Vec<ToolDefinition> {
    vec![LoadMessageDetailTool::schema()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_validates() {
        let registry = default_registry().unwrap();

        assert_eq!(registry.agents().len(), 7);
        assert_eq!(registry.coordinator().unwrap().id, "coordinator");
    }

    #[test]
    fn test_delegate_toolset_covers_managers_and_workers() {
        let registry = default_registry().unwrap();
        let names: Vec<String> = registry
            .delegate_tools()
            .into_iter()
            .map(|t| t.name)
            .collect();

        assert_eq!(
            names,
            vec![
                "delegate_to_analysis_manager",
                "delegate_to_report_manager",
                "delegate_to_scanner",
                "delegate_to_analyzer",
                "delegate_to_assessor",
                "delegate_to_reporter",
            ]
        );
    }

    #[test]
    fn test_workers_with_shell_access() {
        let registry = default_registry().unwrap();

        for id in ["scanner", "analyzer"] {
            let agent = registry.get(id).unwrap();
            assert_eq!(agent.worker_tools.len(), 1);
            assert_eq!(agent.worker_tools[0].name, "run_safe_shell");
        }
        for id in ["assessor", "reporter"] {
            assert!(registry.get(id).unwrap().worker_tools.is_empty());
        }
    }

    #[test]
    fn test_delegate_input_keys() {
        let registry = default_registry().unwrap();

        assert_eq!(registry.get("scanner").unwrap().delegate_input_key, "directory");
        assert_eq!(registry.get("analyzer").unwrap().delegate_input_key, "project");
        assert_eq!(registry.get("assessor").unwrap().delegate_input_key, "projects");
        assert_eq!(registry.get("reporter").unwrap().delegate_input_key, "content");
    }
}
