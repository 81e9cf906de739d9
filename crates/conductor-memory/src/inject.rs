//! Context injection: building the bounded message list for a model call.
//!
//! Injection windows the stored turns by the configured budgets, then
//! substitutes each stretch of turns fully covered by an active memory
//! with that memory's summary. Everything else passes through verbatim.

use chrono::Duration;
use conductor_core::{estimate_tokens, Message};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;

use crate::record::TurnRecord;
use crate::store::MessageStore;

/// Prefix distinguishing an injected memory summary from raw content.
pub const MEMORY_MARKER: &str = "[Memory]";

/// Budget constraints for one injection. All fields are optional and
/// combine by taking the most restrictive start index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InjectOptions {
    /// Keep only the most recent N turns before memory substitution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_messages: Option<usize>,

    /// Trim from the oldest end until the estimated token total fits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,

    /// Drop turns older than the last turn's timestamp minus this window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window_ms: Option<i64>,
}

impl InjectOptions {
    /// No budget: the full log is eligible.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Budget by turn count.
    pub fn max_messages(count: usize) -> Self {
        Self {
            max_messages: Some(count),
            ..Self::default()
        }
    }

    /// Set the token budget.
    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Set the time window in milliseconds.
    pub fn with_time_window_ms(mut self, window_ms: i64) -> Self {
        self.time_window_ms = Some(window_ms);
        self
    }
}

/// Apply the window budgets, returning the eligible suffix of the log.
fn slice_by_options(messages: Vec<TurnRecord>, options: &InjectOptions) -> Vec<TurnRecord> {
    let mut start = 0usize;

    if let Some(max) = options.max_messages {
        if max > 0 {
            start = messages.len().saturating_sub(max);
        }
    }

    if let Some(window_ms) = options.time_window_ms {
        if window_ms > 0 {
            if let Some(last) = messages.last() {
                let cutoff = last.timestamp - Duration::milliseconds(window_ms);
                if let Some(from_time) = messages.iter().position(|m| m.timestamp >= cutoff) {
                    start = start.max(from_time);
                }
            }
        }
    }

    let mut windowed: Vec<TurnRecord> = messages.into_iter().skip(start).collect();

    if let Some(max_tokens) = options.max_tokens {
        if max_tokens > 0 {
            // Walk from the newest end; the turn that crosses the budget is
            // still included, matching the running-total contract.
            let mut tokens = 0usize;
            let mut index = windowed.len();
            while index > 0 && tokens < max_tokens {
                index -= 1;
                tokens += estimate_tokens(&windowed[index].content);
            }
            windowed.drain(..index);
        }
    }

    windowed
}

/// Build the message list for a model call, substituting active memories.
///
/// Single left-to-right pass over the windowed turns: the first turn
/// belonging to a not-yet-used active memory whose covered ids are all
/// present in the window emits one summary message and skips the
/// contiguous run of covered turns behind it. A memory only partially
/// present in the window is not matched and its turns pass through raw.
/// Each memory is substituted at most once; no turn id appears twice.
pub fn build_injected(store: &MessageStore, options: &InjectOptions) -> Vec<Message> {
    let windowed = slice_by_options(store.messages(), options);
    let active = store.active_memories();

    let window_ids: HashSet<&str> = windowed.iter().map(|m| m.id.as_str()).collect();
    let id_sets: Vec<HashSet<&str>> = active
        .iter()
        .map(|m| m.message_ids.iter().map(String::as_str).collect())
        .collect();
    let applicable: Vec<bool> = active
        .iter()
        .map(|m| !m.message_ids.is_empty() && m.message_ids.iter().all(|id| window_ids.contains(id.as_str())))
        .collect();

    let mut injected = Vec::with_capacity(windowed.len());
    let mut used = vec![false; active.len()];

    let mut i = 0;
    while i < windowed.len() {
        let turn = &windowed[i];
        let covering = (0..active.len())
            .find(|&k| applicable[k] && !used[k] && id_sets[k].contains(turn.id.as_str()));

        match covering {
            Some(k) => {
                used[k] = true;
                trace!(memory = %active[k].id, "substituting memory summary");
                injected.push(Message::user(format!("{}\n{}", MEMORY_MARKER, active[k].content)));
                while i + 1 < windowed.len() && id_sets[k].contains(windowed[i + 1].id.as_str()) {
                    i += 1;
                }
            }
            None => injected.push(turn.to_message()),
        }
        i += 1;
    }

    injected
}
