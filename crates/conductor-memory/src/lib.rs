//! Conversation store and memory injection for Conductor.
//!
//! Long conversations cannot fit a model's context budget forever. This
//! crate keeps the full history as an append-only log of [`TurnRecord`]s
//! and lets older stretches be replaced by compressed [`MemoryRecord`]s:
//! a memory stands in for the exact set of turn ids it covers, and the
//! [`inject`] module builds the bounded message list actually sent to the
//! model, substituting summaries where a memory fully applies.
//!
//! Creating and merging memories is a model-driven operation and lives in
//! `conductor-agent`; this crate owns the data and the injection algorithm.

pub mod inject;
pub mod record;
pub mod store;

pub use inject::{build_injected, InjectOptions, MEMORY_MARKER};
pub use record::{MemoryRecord, MemoryStatus, TurnRecord};
pub use store::MessageStore;
