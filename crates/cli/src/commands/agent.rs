//! `amplifai agent` — Interactive or single-message chat mode.

use std::io::Write;
use std::sync::Arc;

use amplifai_agent::{EnsembleAgent, FixedClassifier};
use amplifai_config::AppConfig;
use amplifai_core::agent::Agent;
use amplifai_core::invoker::ModelInvoker;
use amplifai_memory::ContextMemoryManager;
use amplifai_providers::ModelEnsemble;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Wire the agent from config, pinning every turn to `task` when given.
fn build_agent(
    config: &AppConfig,
    memory: Arc<ContextMemoryManager>,
    ensemble: Arc<ModelEnsemble>,
    invoker: Arc<dyn ModelInvoker>,
    task: Option<String>,
) -> EnsembleAgent {
    let agent = EnsembleAgent::from_config(config, memory, ensemble, invoker);
    match task {
        Some(task_type) => agent.with_classifier(Arc::new(FixedClassifier(task_type))),
        None => agent,
    }
}

pub async fn run(message: Option<String>, task: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    tracing::debug!(?config, "Loaded configuration");

    let ensemble = Arc::new(amplifai_providers::build_ensemble(&config)?);
    if ensemble.is_empty() {
        eprintln!();
        eprintln!("  WARNING: No models registered — every message will fail.");
        eprintln!("  Add [[models]] entries to {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
    }

    let invoker = amplifai_providers::build_invoker(&config)?;
    let memory = Arc::new(ContextMemoryManager::new());
    let agent = build_agent(&config, memory, ensemble.clone(), invoker, task.clone());

    if let Some(msg) = message {
        // Single message mode
        let response = agent.respond(&msg).await?;
        println!("{response}");
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Amplifai Agent — Interactive Mode");
    println!();
    println!("  Agent:     {}", agent.name());
    println!("  Invoker:   {}", config.invoker.kind);
    println!("  Models:    {}", ensemble.model_names().join(", "));
    println!("  Policy:    {}", ensemble.policy_name());
    if let Some(task_type) = &task {
        println!("  Task:      {task_type} (fixed)");
    }
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input == "exit" || input == "quit" {
            break;
        }

        match agent.respond(input).await {
            Ok(response) => {
                println!();
                for line in response.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    let state = agent.state();
    println!();
    println!(
        "  {} turns, {} failed, {} tokens. Goodbye!",
        state.requests_processed, state.requests_failed, state.total_tokens
    );
    println!();

    Ok(())
}
