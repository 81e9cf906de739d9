//! Interactive input loops for the two modes.

use std::sync::Arc;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use conductor_agent::{AgentError, AgentRunner, MemoryMaintainer};
use conductor_core::{Message, MessageRole};
use conductor_memory::{build_injected, InjectOptions, MessageStore, TurnRecord};

use crate::catalog;
use crate::error::Result;

/// Compress once this many turns are uncovered by active memories.
const COMPRESS_EVERY_N_MESSAGES: usize = 6;

/// Raw-turn window offered to injection on every chat step.
const INJECT_MAX_MESSAGES: usize = 30;

/// Read one line, treating EOF/interrupt as an exit request.
fn read_line(editor: &mut DefaultEditor) -> Result<Option<String>> {
    match editor.readline("User: ") {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The hierarchy REPL: one persistent coordinator conversation whose tool
/// calls delegate down the registered tree.
pub async fn run_hierarchy(runner: &AgentRunner) -> Result<()> {
    let coordinator = runner
        .registry()
        .coordinator()
        .ok_or_else(|| AgentError::Configuration("no coordinator registered".into()))?;

    let mut conversation = vec![Message::system(&coordinator.system_prompt)];

    println!("--- Hierarchical agents: coordinator -> manager -> worker ---");
    println!("Type 'exit' to quit.\n");

    let mut editor = DefaultEditor::new()?;
    while let Some(line) = read_line(&mut editor)? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }
        let _ = editor.add_history_entry(input);

        conversation.push(Message::user(input));
        runner.run_conversation(&mut conversation).await?;
    }

    Ok(())
}

/// The memory-backed chat REPL: every exchange is persisted to the store,
/// context is rebuilt through injection, and a compression pass runs once
/// enough turns are uncovered.
pub async fn run_chat(
    runner: &AgentRunner,
    store: Arc<MessageStore>,
    maintainer: &MemoryMaintainer,
) -> Result<()> {
    let tools = catalog::chat_tools();

    println!("--- Memory-backed chat with context compression ---");
    println!("Type 'exit' to quit.\n");

    let mut editor = DefaultEditor::new()?;
    while let Some(line) = read_line(&mut editor)? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }
        let _ = editor.add_history_entry(input);

        store.add_message(TurnRecord::new(MessageRole::User, input));

        let mut conversation = vec![Message::system(catalog::chat_system_prompt())];
        conversation.extend(build_injected(
            &store,
            &InjectOptions::max_messages(INJECT_MAX_MESSAGES),
        ));

        runner.run_with_tools(&mut conversation, &tools).await?;

        if let Some(last) = conversation.last() {
            store.add_message(TurnRecord::new(MessageRole::Assistant, &last.content));
        }

        if maintainer.uncompressed_count() >= COMPRESS_EVERY_N_MESSAGES {
            if maintainer
                .run_compress(COMPRESS_EVERY_N_MESSAGES)
                .await?
                .is_some()
            {
                println!("\n[compressed one span of conversation into memory]");
            }
        }
    }

    Ok(())
}
