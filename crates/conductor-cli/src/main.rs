//! Conductor CLI entry point.

mod catalog;
mod cli;
mod error;
mod repl;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use conductor_agent::tools::{LoadMessageDetailTool, SafeShellTool};
use conductor_agent::{
    AgentRegistry, AgentRunner, ConsoleObserver, HttpChatClient, LlmCompressor, MemoryMaintainer,
    ModelConfig, ToolExecutor,
};
use conductor_memory::MessageStore;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Load .env if present (for OPENROUTER_API_KEY etc.).
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> error::Result<()> {
    let mut config = ModelConfig::new(&cli.model);
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }

    match cli.command {
        Commands::Hierarchy => {
            let model = Arc::new(HttpChatClient::from_env(config)?);
            let registry = Arc::new(catalog::default_registry()?);

            let mut executor = ToolExecutor::new();
            executor.register(Arc::new(SafeShellTool::new()));

            let runner = AgentRunner::new(registry, model, Arc::new(executor))
                .with_observer(Arc::new(ConsoleObserver));

            repl::run_hierarchy(&runner).await
        }
        Commands::Chat => {
            let model = Arc::new(HttpChatClient::from_env(config)?);
            let store = Arc::new(MessageStore::new());

            let mut executor = ToolExecutor::new();
            executor.register(Arc::new(LoadMessageDetailTool::new(store.clone())));

            let runner = AgentRunner::new(
                Arc::new(AgentRegistry::new()),
                model.clone(),
                Arc::new(executor),
            )
            .with_observer(Arc::new(ConsoleObserver));

            let maintainer =
                MemoryMaintainer::new(store.clone(), Arc::new(LlmCompressor::new(model)));

            repl::run_chat(&runner, store, &maintainer).await
        }
    }
}
