//! Conversation compression into memory records.
//!
//! A compression pass takes the oldest stored turns not yet covered by any
//! active memory, asks a specialized model call to condense them, and
//! persists the result as a new active [`MemoryRecord`]. Merging coalesces
//! several active memories into one, deactivating the inputs.
//!
//! Compression is total with respect to model output: an unparseable reply
//! falls back to covering the entire input batch with the raw text as the
//! summary, so a bad model turn can never wedge the maintenance cycle.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use conductor_core::Message;
use conductor_memory::{MemoryRecord, MessageStore, TurnRecord};

use crate::client::ChatModel;
use crate::error::Result;

/// System prompt for the compression subagent.
const COMPRESSION_SYSTEM_PROMPT: &str = "\
You are a memory compression specialist. Your task is to condense a span of \
conversation history into one short \"memory\" summary.

Rules:
1. Keep key facts, user preferences, decisions made, and important \
conclusions. Drop greetings and repetition.
2. Write in the third person or as neutral statements, e.g. \"The user \
said...\", \"Both sides confirmed...\".
3. You must return the index back to the original messages: the id of every \
message in this span, in order.
4. Output JSON and nothing else:
   {\"summary\": \"your summary\", \"messageIds\": [\"id1\", \"id2\", ...]}

The messageIds must correspond one-to-one, in order, with the ids of the \
input messages.";

/// System prompt for the merge reduction.
const MERGE_SYSTEM_PROMPT: &str = "\
Merge the following memory summaries into a single, more concise summary \
that keeps the key information. Output only the merged summary text, \
not JSON.";

/// Output of a compression call: the summary and the exact turn ids it
/// covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compression {
    /// Condensed summary text.
    pub summary: String,

    /// Ids of the covered turns.
    pub message_ids: Vec<String>,
}

/// The compression seam: condense turns, reduce summaries.
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Compress a batch of turns into a summary plus covered ids.
    async fn compress(&self, turns: &[TurnRecord]) -> Result<Compression>;

    /// Reduce several summaries to one. Id bookkeeping stays with the
    /// caller.
    async fn merge(&self, summaries: &[String]) -> Result<String>;
}

/// Model-backed compressor speaking the strict-JSON contract.
pub struct LlmCompressor {
    model: Arc<dyn ChatModel>,
}

impl LlmCompressor {
    /// Create a compressor over the given model.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Compressor for LlmCompressor {
    async fn compress(&self, turns: &[TurnRecord]) -> Result<Compression> {
        let rendered = turns
            .iter()
            .map(|t| format!("[id={}] [{}]\n{}", t.id, t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages = vec![
            Message::system(COMPRESSION_SYSTEM_PROMPT),
            Message::user(format!(
                "Compress the following conversation into one memory (JSON):\n\n{}",
                rendered
            )),
        ];

        let reply = self.model.invoke(&messages, &[]).await?;
        Ok(parse_compression_reply(&reply.content, turns))
    }

    async fn merge(&self, summaries: &[String]) -> Result<String> {
        let rendered = summaries
            .iter()
            .enumerate()
            .map(|(i, s)| format!("[{}]\n{}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages = vec![Message::system(MERGE_SYSTEM_PROMPT), Message::user(rendered)];

        let reply = self.model.invoke(&messages, &[]).await?;
        let merged = reply.content.trim().to_string();
        if merged.is_empty() {
            Ok(summaries.join("\n"))
        } else {
            Ok(merged)
        }
    }
}

/// Interpret a compression reply, falling back to full-batch coverage.
///
/// The returned ids are validated against the input batch: ids the model
/// invented are dropped, and an empty or missing list means the whole
/// batch is covered.
fn parse_compression_reply(text: &str, turns: &[TurnRecord]) -> Compression {
    let all_ids = || turns.iter().map(|t| t.id.clone()).collect::<Vec<_>>();

    let trimmed = text.trim();
    let json_slice = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => {
            return Compression {
                summary: trimmed.to_string(),
                message_ids: all_ids(),
            }
        }
    };

    #[derive(serde::Deserialize)]
    struct RawCompression {
        summary: Option<String>,
        #[serde(rename = "messageIds")]
        message_ids: Option<Vec<String>>,
    }

    match serde_json::from_str::<RawCompression>(json_slice) {
        Ok(raw) => {
            let known: HashSet<&str> = turns.iter().map(|t| t.id.as_str()).collect();
            let validated: Vec<String> = raw
                .message_ids
                .unwrap_or_default()
                .into_iter()
                .filter(|id| known.contains(id.as_str()))
                .collect();
            Compression {
                summary: raw.summary.unwrap_or_default(),
                message_ids: if validated.is_empty() { all_ids() } else { validated },
            }
        }
        Err(_) => Compression {
            summary: trimmed.to_string(),
            message_ids: all_ids(),
        },
    }
}

/// Deterministic compressor for tests and offline runs: truncating
/// concatenation instead of a model call.
pub struct TruncatingCompressor;

#[async_trait]
impl Compressor for TruncatingCompressor {
    async fn compress(&self, turns: &[TurnRecord]) -> Result<Compression> {
        let summary = turns
            .iter()
            .map(|t| {
                let truncated: String = t.content.chars().take(100).collect();
                if truncated.len() < t.content.len() {
                    format!("{}: {}...", t.role, truncated)
                } else {
                    format!("{}: {}", t.role, truncated)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Compression {
            summary,
            message_ids: turns.iter().map(|t| t.id.clone()).collect(),
        })
    }

    async fn merge(&self, summaries: &[String]) -> Result<String> {
        Ok(summaries.join("\n"))
    }
}

/// Runs compression and merge passes over a shared store.
pub struct MemoryMaintainer {
    store: Arc<MessageStore>,
    compressor: Arc<dyn Compressor>,
}

impl MemoryMaintainer {
    /// Create a maintainer over the given store and compressor.
    pub fn new(store: Arc<MessageStore>, compressor: Arc<dyn Compressor>) -> Self {
        Self { store, compressor }
    }

    /// The oldest turns not covered by any active memory, up to `take`.
    fn uncompressed(&self, take: usize) -> Vec<TurnRecord> {
        let covered: HashSet<String> = self
            .store
            .active_memories()
            .into_iter()
            .flat_map(|m| m.message_ids)
            .collect();

        self.store
            .messages()
            .into_iter()
            .filter(|m| !covered.contains(&m.id))
            .take(take)
            .collect()
    }

    /// Number of turns not covered by any active memory.
    pub fn uncompressed_count(&self) -> usize {
        self.uncompressed(usize::MAX).len()
    }

    /// Compress the oldest `take_count` uncovered turns into a new active
    /// memory. Returns `None` when nothing is left to compress.
    pub async fn run_compress(&self, take_count: usize) -> Result<Option<MemoryRecord>> {
        let batch = self.uncompressed(take_count);
        if batch.is_empty() {
            return Ok(None);
        }

        let compression = self.compressor.compress(&batch).await?;
        let memory = MemoryRecord::new(compression.summary, compression.message_ids);
        debug!(id = %memory.id, covered = memory.message_ids.len(), "created memory");
        self.store.add_memory(memory.clone());
        Ok(Some(memory))
    }

    /// Merge the given active memories into one new active memory,
    /// deactivating the inputs. Fewer than two resolvable memories is a
    /// no-op returning `None`.
    pub async fn run_merge(&self, memory_ids: &[String]) -> Result<Option<MemoryRecord>> {
        let active = self.store.active_memories();
        let to_merge: Vec<MemoryRecord> = memory_ids
            .iter()
            .filter_map(|id| active.iter().find(|m| &m.id == id).cloned())
            .collect();

        if to_merge.len() < 2 {
            return Ok(None);
        }

        let summaries: Vec<String> = to_merge.iter().map(|m| m.content.clone()).collect();
        let merged_content = self.compressor.merge(&summaries).await?;

        let mut seen = HashSet::new();
        let merged_ids: Vec<String> = to_merge
            .iter()
            .flat_map(|m| m.message_ids.iter().cloned())
            .filter(|id| seen.insert(id.clone()))
            .collect();

        let memory = MemoryRecord::new(merged_content, merged_ids);
        self.store.add_memory(memory.clone());

        for old in &to_merge {
            self.store.mark_merged_into(&old.id, &memory.id);
        }

        debug!(id = %memory.id, merged = to_merge.len(), "merged memories");
        Ok(Some(memory))
    }
}
