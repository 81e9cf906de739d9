//! CLI error type.

use thiserror::Error;

/// Errors surfaced at the top level of the CLI.
#[derive(Error, Debug)]
pub enum CliError {
    /// Orchestration engine failure.
    #[error(transparent)]
    Agent(#[from] conductor_agent::AgentError),

    /// Line-editor failure.
    #[error("readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
