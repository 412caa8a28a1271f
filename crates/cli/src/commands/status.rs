//! `amplifai status` — Show configuration summary.

use amplifai_config::AppConfig;
use amplifai_core::invoker::ModelInvoker;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Amplifai Status");
    println!("===============");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Agent:          {}", config.agent.name);
    println!("  Models:         {}", config.models.len());
    println!("  Policy:         {}", config.selection.policy);
    println!("  Duplicates:     {}", config.selection.duplicates);
    println!("  Record output:  {}", if config.agent.record_output { "yes" } else { "no" });
    println!(
        "  Context window: {}",
        config
            .agent
            .context_window
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".into())
    );
    println!("  Invoker:        {} ({})", config.invoker.kind, config.invoker.base_url);
    println!("  API key:        {}", if config.has_api_key() { "set" } else { "not set" });

    match amplifai_providers::build_invoker(&config) {
        Ok(invoker) => match invoker.health_check().await {
            Ok(true) => println!("  Backend:        reachable ({})", invoker.name()),
            Ok(false) => println!("  Backend:        responded with an error ({})", invoker.name()),
            Err(e) => println!("  Backend:        unreachable: {e}"),
        },
        Err(e) => println!("  Backend:        not configured: {e}"),
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `amplifai onboard` first");
    }

    Ok(())
}
