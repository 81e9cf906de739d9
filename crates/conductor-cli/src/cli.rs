//! Command-line interface definition using clap.

use clap::{Parser, Subcommand};

/// Conductor - hierarchical multi-agent orchestration with conversation memory.
#[derive(Parser, Debug)]
#[command(name = "conductor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Model identifier passed to the chat-completions endpoint
    #[arg(short, long, env = "CONDUCTOR_MODEL", default_value = "anthropic/claude-sonnet-4")]
    pub model: String,

    /// Chat-completions endpoint URL (defaults to OpenRouter)
    #[arg(long, env = "CONDUCTOR_BASE_URL")]
    pub base_url: Option<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the coordinator -> manager -> worker delegation REPL
    Hierarchy,

    /// Run the memory-backed chat REPL with context compression
    Chat,
}
