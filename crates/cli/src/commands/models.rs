//! `amplifai models` — Show the ensemble and resolve task types.

use amplifai_agent::KeywordClassifier;
use amplifai_agent::TaskClassifier as _;
use amplifai_config::AppConfig;

pub async fn run(task: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let ensemble = amplifai_providers::build_ensemble(&config)?;

    println!("Model Ensemble");
    println!("==============");
    println!("  Policy:      {}", ensemble.policy_name());
    println!("  Duplicates:  {}", config.selection.duplicates);
    println!();

    let models = ensemble.models();
    if models.is_empty() {
        println!("  (no models registered)");
    }
    for (i, model) in models.iter().enumerate() {
        if model.tags.is_empty() {
            println!("  {}. {}", i + 1, model.name);
        } else {
            println!("  {}. {}  [{}]", i + 1, model.name, model.tags.join(", "));
        }
    }

    println!();
    let task_types = match task {
        Some(t) => vec![t],
        None => {
            let classifier = KeywordClassifier::from_settings(&config.agent);
            let mut types: Vec<String> = classifier.rules().iter().map(|r| r.task_type.clone()).collect();
            types.push(classifier.classify(""));
            types
        }
    };

    for task_type in task_types {
        match ensemble.select_model(&task_type) {
            Ok(model) => println!("  {task_type:<12} -> {model}"),
            Err(e) => println!("  {task_type:<12} -> error: {e}"),
        }
    }

    Ok(())
}
