//! Progress observation seam.
//!
//! The runner reports agent starts, assistant previews, tool calls, and
//! tool results through an [`Observer`] instead of writing to the console
//! from inside the control flow. The sink is line-oriented and purely
//! diagnostic; ordering is the only guarantee.

use tracing::info;

use crate::agent::AgentLevel;

/// Truncate a string to at most `max` characters, appending an ellipsis.
fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// Sink for depth-indented progress lines.
pub trait Observer: Send + Sync {
    /// An agent's conversation is starting.
    fn agent_start(&self, level: AgentLevel, agent_id: &str, depth: usize) {
        let _ = (level, agent_id, depth);
    }

    /// The model produced assistant text.
    fn assistant_message(&self, content: &str, depth: usize) {
        let _ = (content, depth);
    }

    /// A tool call is about to be dispatched.
    fn tool_call(&self, name: &str, arguments: &str, depth: usize) {
        let _ = (name, arguments, depth);
    }

    /// A tool call produced a result.
    fn tool_result(&self, content: &str, depth: usize) {
        let _ = (content, depth);
    }
}

/// Observer that discards everything. Default for tests.
pub struct NullObserver;

impl Observer for NullObserver {}

/// Observer printing tab-indented progress lines to stdout.
pub struct ConsoleObserver;

impl Observer for ConsoleObserver {
    fn agent_start(&self, level: AgentLevel, agent_id: &str, depth: usize) {
        let prefix = "\t".repeat(depth);
        println!("\n{}[{}] {}", prefix, level.to_string().to_uppercase(), agent_id);
    }

    fn assistant_message(&self, content: &str, depth: usize) {
        let prefix = "\t".repeat(depth);
        let shown = preview(content, 80);
        let indented: Vec<String> = shown
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    line.to_string()
                } else {
                    format!("{}{}", prefix, line)
                }
            })
            .collect();
        println!("\n{}AI: {}", prefix, indented.join("\n"));
    }

    fn tool_call(&self, name: &str, arguments: &str, depth: usize) {
        let prefix = "\t".repeat(depth);
        println!("{}Tool: {}({})", prefix, name, preview(arguments.trim(), 80));
    }

    fn tool_result(&self, content: &str, depth: usize) {
        let prefix = "\t".repeat(depth);
        let flat = preview(content, 100).replace('\n', " ");
        println!("{}  -> {}", prefix, flat);
    }
}

/// Observer emitting structured tracing events.
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn agent_start(&self, level: AgentLevel, agent_id: &str, depth: usize) {
        info!(%level, agent_id, depth, "agent start");
    }

    fn assistant_message(&self, content: &str, depth: usize) {
        info!(depth, preview = %preview(content, 80), "assistant message");
    }

    fn tool_call(&self, name: &str, arguments: &str, depth: usize) {
        info!(depth, tool = name, args = %preview(arguments, 80), "tool call");
    }

    fn tool_result(&self, content: &str, depth: usize) {
        info!(depth, result = %preview(content, 100), "tool result");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("hello", 80), "hello");
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "x".repeat(120);
        let shown = preview(&long, 80);
        assert_eq!(shown.chars().count(), 83);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let text = "é".repeat(100);
        let shown = preview(&text, 80);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_null_observer_is_silent() {
        let observer = NullObserver;
        observer.agent_start(AgentLevel::Worker, "scanner", 2);
        observer.assistant_message("content", 0);
        observer.tool_call("run_safe_shell", "{}", 1);
        observer.tool_result("output", 1);
    }
}
