//! Append-only message store with memory records.
//!
//! The store is an explicit object threaded through every call rather than
//! ambient global state, so tests and multiple sessions can each own one.
//! It is internally synchronized: tool implementations hold it through an
//! `Arc` and read it while the owning loop is suspended on a model call.
//! All reads return snapshot copies, never live references.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::record::{MemoryRecord, MemoryStatus, TurnRecord};

#[derive(Default)]
struct StoreInner {
    messages: Vec<TurnRecord>,
    memories: Vec<MemoryRecord>,
}

/// Process-lifetime conversation log plus memory collection.
///
/// Messages are append-only: ids are never mutated and records are never
/// removed short of [`MessageStore::clear`]. Memories are never deleted
/// either; merging deactivates them in place.
#[derive(Default)]
pub struct MessageStore {
    inner: RwLock<StoreInner>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a turn to the log.
    pub fn add_message(&self, record: TurnRecord) {
        debug!(id = %record.id, role = %record.role, "storing turn");
        self.write().messages.push(record);
    }

    /// Snapshot of all turns in append order.
    pub fn messages(&self) -> Vec<TurnRecord> {
        self.read().messages.clone()
    }

    /// Look up a single turn by id.
    pub fn message_by_id(&self, id: &str) -> Option<TurnRecord> {
        self.read().messages.iter().find(|m| m.id == id).cloned()
    }

    /// Number of stored turns.
    pub fn message_count(&self) -> usize {
        self.read().messages.len()
    }

    /// Add a memory record.
    pub fn add_memory(&self, memory: MemoryRecord) {
        debug!(id = %memory.id, covered = memory.message_ids.len(), "storing memory");
        self.write().memories.push(memory);
    }

    /// Snapshot of all memory records, active and inactive.
    pub fn memories(&self) -> Vec<MemoryRecord> {
        self.read().memories.clone()
    }

    /// Snapshot of the active memories only.
    pub fn active_memories(&self) -> Vec<MemoryRecord> {
        self.read()
            .memories
            .iter()
            .filter(|m| m.is_active())
            .cloned()
            .collect()
    }

    /// Look up a memory by id.
    pub fn memory_by_id(&self, id: &str) -> Option<MemoryRecord> {
        self.read().memories.iter().find(|m| m.id == id).cloned()
    }

    /// Set the given memories to inactive.
    pub fn deactivate_memories(&self, ids: &[String]) {
        let mut inner = self.write();
        for memory in inner.memories.iter_mut() {
            if ids.contains(&memory.id) {
                memory.status = MemoryStatus::Inactive;
            }
        }
    }

    /// Deactivate a memory and record its merge target in one update.
    pub fn mark_merged_into(&self, memory_id: &str, merged_into_id: &str) {
        let mut inner = self.write();
        if let Some(memory) = inner.memories.iter_mut().find(|m| m.id == memory_id) {
            memory.status = MemoryStatus::Inactive;
            memory.merged_into_id = Some(merged_into_id.to_string());
        }
    }

    /// Reset both collections. Test isolation only.
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.messages.clear();
        inner.memories.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_core::MessageRole;
    use std::collections::HashSet;

    fn turn(id: &str, content: &str) -> TurnRecord {
        TurnRecord::with_id(id, MessageRole::User, content)
    }

    #[test]
    fn test_append_preserves_count_and_unique_ids() {
        let store = MessageStore::new();
        for _ in 0..20 {
            store.add_message(TurnRecord::new(MessageRole::User, "m"));
        }

        let messages = store.messages();
        assert_eq!(messages.len(), 20);

        let ids: HashSet<String> = messages.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_append_order_is_preserved() {
        let store = MessageStore::new();
        store.add_message(turn("a", "first"));
        store.add_message(turn("b", "second"));
        store.add_message(turn("c", "third"));

        let contents: Vec<String> = store.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_message_by_id() {
        let store = MessageStore::new();
        store.add_message(turn("t1", "hello"));

        assert_eq!(store.message_by_id("t1").unwrap().content, "hello");
        assert!(store.message_by_id("nope").is_none());
    }

    #[test]
    fn test_reads_are_snapshots() {
        let store = MessageStore::new();
        store.add_message(turn("t1", "hello"));

        let snapshot = store.messages();
        store.add_message(turn("t2", "world"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.message_count(), 2);
    }

    #[test]
    fn test_active_memories_filtering() {
        let store = MessageStore::new();
        store.add_memory(MemoryRecord::with_id("mem_a", "a", vec!["t1".into()]));
        store.add_memory(MemoryRecord::with_id("mem_b", "b", vec!["t2".into()]));

        store.deactivate_memories(&["mem_a".to_string()]);

        let active = store.active_memories();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "mem_b");
        assert_eq!(store.memories().len(), 2);
    }

    #[test]
    fn test_mark_merged_into_is_atomic_update() {
        let store = MessageStore::new();
        store.add_memory(MemoryRecord::with_id("mem_a", "a", vec!["t1".into()]));

        store.mark_merged_into("mem_a", "mem_z");

        let memory = store.memory_by_id("mem_a").unwrap();
        assert_eq!(memory.status, MemoryStatus::Inactive);
        assert_eq!(memory.merged_into_id.as_deref(), Some("mem_z"));
    }

    #[test]
    fn test_clear_resets_both_collections() {
        let store = MessageStore::new();
        store.add_message(turn("t1", "x"));
        store.add_memory(MemoryRecord::with_id("mem_a", "a", vec!["t1".into()]));

        store.clear();

        assert_eq!(store.message_count(), 0);
        assert!(store.memories().is_empty());
    }
}
