//! Agent execution loop and hierarchical dispatcher.
//!
//! One procedure drives every agent conversation: invoke the model, append
//! the reply, stop on the terminal marker, otherwise dispatch any tool
//! calls and go again. Delegate-tool calls recurse into a fresh
//! conversation for the named child agent, depth-first and strictly
//! sequential; the child's final answer becomes the tool's result string.
//!
//! Failure semantics: tool dispatch failures are converted into result
//! strings at per-call granularity and never abort the loop. Model
//! transport failures, unknown agents, the iteration cap, and the
//! delegation depth cap are fatal and propagate to the caller.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

use conductor_core::{
    contains_terminal_marker, strip_terminal_marker, Message, ToolCall, ToolDefinition,
};

use crate::client::ChatModel;
use crate::config::RunnerConfig;
use crate::error::{AgentError, Result};
use crate::executor::ToolExecutor;
use crate::observer::{NullObserver, Observer};
use crate::registry::AgentRegistry;

/// How tool calls in a loop are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolRouting {
    /// Dispatch through the primitive tool executor only.
    Primitive,
    /// Route delegate-tool names to child agents first, fall back to the
    /// executor (which answers unknown names with its sentinel).
    Delegating,
}

/// Drives agent conversations against a registry, model, and tool set.
pub struct AgentRunner {
    registry: Arc<AgentRegistry>,
    model: Arc<dyn ChatModel>,
    executor: Arc<ToolExecutor>,
    observer: Arc<dyn Observer>,
    config: RunnerConfig,
}

impl AgentRunner {
    /// Create a runner with the default limits and a silent observer.
    pub fn new(
        registry: Arc<AgentRegistry>,
        model: Arc<dyn ChatModel>,
        executor: Arc<ToolExecutor>,
    ) -> Self {
        Self {
            registry,
            model,
            executor,
            observer: Arc::new(NullObserver),
            config: RunnerConfig::default(),
        }
    }

    /// Set the progress observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the loop and depth limits.
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// The registry this runner dispatches against.
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Drive a conversation whose tool calls delegate to registered
    /// agents. Returns the final assistant content with the terminal
    /// marker stripped; the stored conversation keeps it.
    pub async fn run_conversation(&self, conversation: &mut Vec<Message>) -> Result<String> {
        let tools = self.registry.delegate_tools();
        self.run_loop(conversation, &tools, ToolRouting::Delegating, 0)
            .await?;
        Ok(final_content(conversation))
    }

    /// Drive a conversation against primitive tools only.
    pub async fn run_with_tools(
        &self,
        conversation: &mut Vec<Message>,
        tools: &[ToolDefinition],
    ) -> Result<String> {
        self.run_loop(conversation, tools, ToolRouting::Primitive, 0)
            .await?;
        Ok(final_content(conversation))
    }

    /// Delegate a task to a registered agent and return its condensed
    /// answer. Unknown agent ids fail before any model call is made.
    pub async fn delegate(
        &self,
        agent_id: &str,
        task: &str,
        options: Option<Map<String, Value>>,
    ) -> Result<String> {
        self.delegate_at(agent_id.to_string(), task.to_string(), options, 0)
            .await
    }

    /// Recursive delegation entry. Boxed because the loop and the
    /// dispatcher call each other.
    fn delegate_at(
        &self,
        agent_id: String,
        task: String,
        options: Option<Map<String, Value>>,
        depth: usize,
    ) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            if depth > self.config.max_depth {
                return Err(AgentError::Configuration(format!(
                    "delegation depth {} exceeds maximum {}",
                    depth, self.config.max_depth
                )));
            }

            let agent = self
                .registry
                .get(&agent_id)
                .ok_or_else(|| AgentError::Configuration(format!("unknown agent: {}", agent_id)))?
                .clone();

            let mut task_text = task;
            if let Some(options) = options.filter(|o| !o.is_empty()) {
                let rendered = serde_json::to_string_pretty(&Value::Object(options))?;
                task_text = format!("{}\n\nOptions:\n{}", task_text, rendered);
            }

            self.observer.agent_start(agent.level, &agent.id, depth);

            let mut conversation = vec![
                Message::system(&agent.system_prompt),
                Message::user(task_text),
            ];

            let (tools, routing) = if agent.is_delegating() {
                (self.registry.delegate_tools(), ToolRouting::Delegating)
            } else {
                (agent.worker_tools.clone(), ToolRouting::Primitive)
            };

            self.run_loop(&mut conversation, &tools, routing, depth).await?;

            Ok(final_content(&conversation))
        })
    }

    /// One agent's conversation loop.
    async fn run_loop(
        &self,
        conversation: &mut Vec<Message>,
        tools: &[ToolDefinition],
        routing: ToolRouting,
        depth: usize,
    ) -> Result<()> {
        let mut iterations = 0u32;
        loop {
            if iterations >= self.config.max_iterations {
                return Err(AgentError::MaxIterationsExceeded(self.config.max_iterations));
            }
            iterations += 1;

            let reply = self.model.invoke(conversation, tools).await?;

            // Appended unconditionally, even with empty content, so any
            // attached tool calls keep their turn slot.
            conversation.push(reply.to_message());

            if !reply.content.is_empty() {
                self.observer.assistant_message(&reply.content, depth);
            }

            if contains_terminal_marker(&reply.content) {
                return Ok(());
            }

            if reply.tool_calls.is_empty() {
                // Plain conversational end without an explicit signal.
                return Ok(());
            }

            for call in &reply.tool_calls {
                self.observer.tool_call(&call.name, &call.arguments, depth);
                let result = self.dispatch_call(call, routing, depth).await?;
                self.observer.tool_result(&result, depth);
                conversation.push(Message::tool(&call.id, result));
            }
        }
    }

    /// Dispatch one tool call. `Ok` carries the result string, including
    /// recovered per-call failures; `Err` is reserved for fatal conditions
    /// inside a delegation (unknown agent, depth, model transport).
    async fn dispatch_call(
        &self,
        call: &ToolCall,
        routing: ToolRouting,
        depth: usize,
    ) -> Result<String> {
        if routing == ToolRouting::Delegating {
            if let Some(agent) = self.registry.agent_for_delegate_tool(&call.name) {
                let mut args = match call.parse_arguments() {
                    Ok(args) => args,
                    Err(e) => {
                        return Ok(format!("Error: invalid arguments for {}: {}", call.name, e))
                    }
                };
                let task = match args.remove(&agent.delegate_input_key) {
                    Some(Value::String(task)) => task,
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                let options = if args.is_empty() { None } else { Some(args) };
                let agent_id = agent.id.clone();
                return self.delegate_at(agent_id, task, options, depth + 1).await;
            }
        }
        Ok(self.executor.dispatch(call).await)
    }
}

/// Final assistant content with all marker occurrences stripped.
fn final_content(conversation: &[Message]) -> String {
    conversation
        .last()
        .map(|m| strip_terminal_marker(&m.content))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentDef, AgentLevel};
    use crate::client::AssistantReply;
    use crate::executor::Tool;
    use async_trait::async_trait;
    use conductor_core::{MessageRole, ToolDefinition};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Model stub replaying a fixed script of replies.
    struct ScriptedModel {
        replies: Mutex<VecDeque<AssistantReply>>,
        calls: AtomicUsize,
        received: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<AssistantReply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                received: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn received(&self) -> Vec<Vec<Message>> {
            self.received.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn invoke(
            &self,
            messages: &[Message],
            _tools: &[ToolDefinition],
        ) -> Result<AssistantReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.received.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AgentError::ModelInvocation("script exhausted".into()))
        }
    }

    /// Echoes its `tag` argument.
    struct TagTool {
        definition: ToolDefinition,
    }

    impl TagTool {
        fn new() -> Self {
            Self {
                definition: ToolDefinition::new(
                    "tag",
                    "Echo the tag argument",
                    json!({
                        "type": "object",
                        "properties": {"tag": {"type": "string", "description": "Tag"}},
                        "required": ["tag"]
                    }),
                ),
            }
        }
    }

    #[async_trait]
    impl Tool for TagTool {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(&self, args: &Map<String, Value>) -> Result<String> {
            Ok(args
                .get("tag")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string())
        }
    }

    struct FailingTool {
        definition: ToolDefinition,
    }

    impl FailingTool {
        fn new() -> Self {
            Self {
                definition: ToolDefinition::no_params("broken", "Always fails"),
            }
        }
    }

    #[async_trait]
    impl Tool for FailingTool {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(&self, _args: &Map<String, Value>) -> Result<String> {
            Err(AgentError::ToolExecution {
                tool_name: "broken".into(),
                message: "boom".into(),
            })
        }
    }

    fn delegate_tool(name: &str, input_key: &str) -> ToolDefinition {
        ToolDefinition::new(
            name,
            "Delegate a task",
            json!({
                "type": "object",
                "properties": {input_key: {"type": "string", "description": "Task"}},
                "required": [input_key]
            }),
        )
    }

    fn registry() -> Arc<AgentRegistry> {
        let mut registry = AgentRegistry::new();
        registry
            .register(AgentDef::new(
                "coordinator",
                AgentLevel::Coordinator,
                "You coordinate.",
                delegate_tool("delegate_to_coordinator", "task"),
                "task",
            ))
            .unwrap();
        registry
            .register(
                AgentDef::new(
                    "manager",
                    AgentLevel::Manager,
                    "You manage.",
                    delegate_tool("delegate_to_manager", "task"),
                    "task",
                )
                .with_parent("coordinator"),
            )
            .unwrap();
        registry
            .register(
                AgentDef::new(
                    "worker",
                    AgentLevel::Worker,
                    "You work.",
                    delegate_tool("delegate_to_worker", "task"),
                    "task",
                )
                .with_parent("manager")
                .with_worker_tools(vec![TagTool::new().definition.clone()]),
            )
            .unwrap();
        Arc::new(registry)
    }

    fn executor() -> Arc<ToolExecutor> {
        let mut executor = ToolExecutor::new();
        executor.register(Arc::new(TagTool::new()));
        executor.register(Arc::new(FailingTool::new()));
        Arc::new(executor)
    }

    fn runner(model: Arc<ScriptedModel>) -> AgentRunner {
        AgentRunner::new(registry(), model, executor())
    }

    #[tokio::test]
    async fn test_marker_terminates_after_one_call() {
        let model = Arc::new(ScriptedModel::new(vec![AssistantReply::text(
            "All done. [STOP]",
        )]));
        let runner = runner(model.clone());

        let mut conversation = vec![Message::system("sys"), Message::user("go")];
        let result = runner
            .run_with_tools(&mut conversation, &[])
            .await
            .unwrap();

        assert_eq!(model.call_count(), 1);
        assert_eq!(conversation.len(), 3);
        assert_eq!(result, "All done.");
        // The stored turn keeps the marker.
        assert!(conversation[2].content.contains("[STOP]"));
    }

    #[tokio::test]
    async fn test_plain_reply_without_marker_terminates() {
        let model = Arc::new(ScriptedModel::new(vec![AssistantReply::text("Hi there.")]));
        let runner = runner(model.clone());

        let mut conversation = vec![Message::user("hello")];
        let result = runner.run_with_tools(&mut conversation, &[]).await.unwrap();

        assert_eq!(model.call_count(), 1);
        assert_eq!(result, "Hi there.");
    }

    #[tokio::test]
    async fn test_tool_results_appended_in_request_order() {
        let calls = vec![
            ToolCall::with_id("c1", "tag", json!({"tag": "A"})),
            ToolCall::with_id("c2", "tag", json!({"tag": "B"})),
            ToolCall::with_id("c3", "tag", json!({"tag": "C"})),
        ];
        let model = Arc::new(ScriptedModel::new(vec![
            AssistantReply::with_tool_calls("", calls),
            AssistantReply::text("done [STOP]"),
        ]));
        let runner = runner(model.clone());

        let mut conversation = vec![Message::user("go")];
        runner
            .run_with_tools(&mut conversation, &[TagTool::new().definition.clone()])
            .await
            .unwrap();

        // user, assistant(tool_calls), tool A, tool B, tool C, assistant.
        assert_eq!(conversation.len(), 6);
        assert_eq!(conversation[1].role, MessageRole::Assistant);
        let order: Vec<&str> = conversation[2..5].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        let ids: Vec<&str> = conversation[2..5]
            .iter()
            .map(|m| m.tool_call_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[tokio::test]
    async fn test_failing_tool_does_not_abort_siblings() {
        let calls = vec![
            ToolCall::with_id("c1", "tag", json!({"tag": "first"})),
            ToolCall::with_id("c2", "broken", json!({})),
            ToolCall::with_id("c3", "tag", json!({"tag": "third"})),
        ];
        let model = Arc::new(ScriptedModel::new(vec![
            AssistantReply::with_tool_calls("", calls),
            AssistantReply::text("recovered [STOP]"),
        ]));
        let runner = runner(model.clone());

        let mut conversation = vec![Message::user("go")];
        let result = runner
            .run_with_tools(&mut conversation, &[])
            .await
            .unwrap();

        assert_eq!(result, "recovered");
        assert_eq!(conversation[2].content, "first");
        assert!(conversation[3].content.starts_with("Error:"));
        assert_eq!(conversation[4].content, "third");
    }

    #[tokio::test]
    async fn test_unknown_agent_fails_before_any_model_call() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let runner = runner(model.clone());

        let result = runner.delegate("ghost", "do something", None).await;

        assert!(matches!(result, Err(AgentError::Configuration(_))));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_delegation_result_is_marker_stripped_and_trimmed() {
        let model = Arc::new(ScriptedModel::new(vec![AssistantReply::text(
            "  Scan complete. [STOP]  ",
        )]));
        let runner = runner(model.clone());

        let result = runner.delegate("worker", "scan", None).await.unwrap();
        assert_eq!(result, "Scan complete.");
    }

    #[tokio::test]
    async fn test_options_rendered_into_task() {
        let model = Arc::new(ScriptedModel::new(vec![AssistantReply::text("ok [STOP]")]));
        let runner = runner(model.clone());

        let mut options = Map::new();
        options.insert("filter".to_string(), json!("*.rs"));
        runner.delegate("worker", "scan src", Some(options)).await.unwrap();

        let received = model.received();
        let seeded = &received[0];
        assert_eq!(seeded.len(), 2);
        assert_eq!(seeded[0].role, MessageRole::System);
        assert!(seeded[1].content.starts_with("scan src"));
        assert!(seeded[1].content.contains("Options:"));
        assert!(seeded[1].content.contains("\"filter\""));
    }

    #[tokio::test]
    async fn test_full_hierarchy_delegation() {
        // coordinator -> manager -> worker -> primitive tool, then each
        // level reports back up with the marker.
        let model = Arc::new(ScriptedModel::new(vec![
            AssistantReply::with_tool_calls(
                "",
                vec![ToolCall::with_id(
                    "d1",
                    "delegate_to_manager",
                    json!({"task": "analyze the project"}),
                )],
            ),
            AssistantReply::with_tool_calls(
                "",
                vec![ToolCall::with_id(
                    "d2",
                    "delegate_to_worker",
                    json!({"task": "scan sources"}),
                )],
            ),
            AssistantReply::with_tool_calls(
                "",
                vec![ToolCall::with_id("t1", "tag", json!({"tag": "12 files"}))],
            ),
            AssistantReply::text("Found 12 files. [STOP]"),
            AssistantReply::text("Analysis finished. [STOP]"),
            AssistantReply::text("Report: analysis finished. [STOP]"),
        ]));
        let runner = runner(model.clone());

        let mut conversation = vec![Message::system("You coordinate."), Message::user("analyze")];
        let result = runner.run_conversation(&mut conversation).await.unwrap();

        assert_eq!(result, "Report: analysis finished.");
        assert_eq!(model.call_count(), 6);

        // The manager's answer is the coordinator's tool result.
        let tool_turn = conversation
            .iter()
            .find(|m| m.role == MessageRole::Tool)
            .unwrap();
        assert_eq!(tool_turn.content, "Analysis finished.");
        assert_eq!(tool_turn.tool_call_id.as_deref(), Some("d1"));
    }

    #[tokio::test]
    async fn test_depth_cap_is_configuration_error() {
        // Managers ping-pong delegations until the cap trips.
        let bounce = |id: &str| {
            AssistantReply::with_tool_calls(
                "",
                vec![ToolCall::with_id(
                    format!("b-{}", id),
                    "delegate_to_manager",
                    json!({"task": "again"}),
                )],
            )
        };
        let model = Arc::new(ScriptedModel::new(vec![
            bounce("1"),
            bounce("2"),
            bounce("3"),
        ]));
        let runner = runner(model.clone()).with_config(RunnerConfig::default().with_max_depth(2));

        let result = runner.delegate("manager", "start", None).await;

        assert!(matches!(result, Err(AgentError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let spin = || {
            AssistantReply::with_tool_calls(
                "",
                vec![ToolCall::with_id("s", "tag", json!({"tag": "x"}))],
            )
        };
        let model = Arc::new(ScriptedModel::new(vec![spin(), spin(), spin(), spin()]));
        let runner =
            runner(model.clone()).with_config(RunnerConfig::default().with_max_iterations(3));

        let mut conversation = vec![Message::user("go")];
        let result = runner.run_with_tools(&mut conversation, &[]).await;

        assert!(matches!(result, Err(AgentError::MaxIterationsExceeded(3))));
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        // Empty script: the first invoke fails.
        let model = Arc::new(ScriptedModel::new(vec![]));
        let runner = runner(model.clone());

        let result = runner.delegate("worker", "task", None).await;
        assert!(matches!(result, Err(AgentError::ModelInvocation(_))));
    }

    #[tokio::test]
    async fn test_unknown_delegate_tool_gets_sentinel() {
        let model = Arc::new(ScriptedModel::new(vec![
            AssistantReply::with_tool_calls(
                "",
                vec![ToolCall::with_id("u1", "delegate_to_ghost", json!({"task": "x"}))],
            ),
            AssistantReply::text("ok [STOP]"),
        ]));
        let runner = runner(model.clone());

        let mut conversation = vec![Message::user("go")];
        runner.run_conversation(&mut conversation).await.unwrap();

        let tool_turn = conversation
            .iter()
            .find(|m| m.role == MessageRole::Tool)
            .unwrap();
        assert_eq!(tool_turn.content, "Unknown tool: delegate_to_ghost");
    }
}
