//! `workflow-engine` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`    — start the API server.
//! - `validate` — validate a workflow JSON file without running it.

mod config;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use config::Config;
use engine::WorkflowEngine;
use manager::ExecutionManager;
use model_client::OllamaClient;
use nodes::NodeRegistry;

#[derive(Parser)]
#[command(name = "workflow-engine", about = "DAG workflow execution engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Validate a workflow definition JSON file.
    Validate {
        /// Path to the workflow JSON file, in the canvas wire format
        /// (`{nodes: [...], edges: [...]}`).
        path: std::path::PathBuf,
    },
}

fn init_tracing(config: &Config) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_registry(config: &Config) -> NodeRegistry {
    let mut registry = NodeRegistry::default();
    let client = OllamaClient::new(
        config.ollama_base_url.clone(),
        std::time::Duration::from_secs_f64(config.ollama_timeout_secs),
        config.ollama_max_connections,
    );
    registry.register_llm(Arc::new(client));
    registry
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config);

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind_address());
            info!(app = %config.app_name, version = %config.app_version, %bind, "starting server");

            let registry = Arc::new(build_registry(&config));
            let engine = Arc::new(WorkflowEngine::new(registry));
            let manager = ExecutionManager::new(engine);

            api::serve(&bind, manager).await?;
        }
        Command::Validate { path } => {
            let content = std::fs::read_to_string(&path)?;
            let wire: api::wire::FlowDefinition = serde_json::from_str(&content)?;
            let workflow: engine::WorkflowDefinition = wire.into();

            match engine::validate_dag(&workflow) {
                Ok(order) => println!("workflow is valid; execution order: {order:?}"),
                Err(e) => {
                    eprintln!("validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
