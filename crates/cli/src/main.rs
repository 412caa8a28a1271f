//! Amplifai CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a default config file
//! - `agent`   — Interactive chat or single-message mode
//! - `models`  — Show the model ensemble and what it selects
//! - `status`  — Show configuration summary

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "amplifai",
    about = "Amplifai — ensemble-backed conversational agent shell",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Chat with the agent
    Agent {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Force a task type instead of classifying each input
        #[arg(short, long)]
        task: Option<String>,
    },

    /// List registered models and show which one a task type selects
    Models {
        /// Task type to resolve
        #[arg(short, long)]
        task: Option<String>,
    },

    /// Show configuration summary
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Agent { message, task } => commands::agent::run(message, task).await?,
        Commands::Models { task } => commands::models::run(task).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
