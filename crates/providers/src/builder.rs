//! Build the ensemble and the invoker from configuration.

use std::sync::Arc;
use std::time::Duration;

use amplifai_config::AppConfig;
use amplifai_core::error::{AmplifaiError, InvokeError, Result};
use amplifai_core::invoker::ModelInvoker;
use tracing::info;

use crate::echo::EchoInvoker;
use crate::ensemble::{DuplicatePolicy, ModelDescriptor, ModelEnsemble};
use crate::fallback::FallbackInvoker;
use crate::openai_compat::OpenAiCompatInvoker;
use crate::selection::policy_from_name;

/// Build a model ensemble from the `[[models]]` and `[selection]` sections.
pub fn build_ensemble(config: &AppConfig) -> Result<ModelEnsemble> {
    let policy = policy_from_name(&config.selection.policy).ok_or_else(|| {
        AmplifaiError::Internal(format!(
            "unknown selection policy '{}'",
            config.selection.policy
        ))
    })?;
    let duplicates = DuplicatePolicy::from_name(&config.selection.duplicates).ok_or_else(|| {
        AmplifaiError::Internal(format!(
            "unknown duplicate policy '{}'",
            config.selection.duplicates
        ))
    })?;

    let ensemble = ModelEnsemble::new()
        .with_policy(policy)
        .with_duplicate_policy(duplicates);

    for model in &config.models {
        ensemble.register(ModelDescriptor::new(&model.name).with_tags(model.tags.iter().cloned()))?;
    }

    info!(
        models = ensemble.len(),
        policy = ensemble.policy_name(),
        "Model ensemble ready"
    );
    Ok(ensemble)
}

/// Build the model invoker from the `[invoker]` section.
///
/// `openai_compat` talks to `base_url` alone unless `fallback_base_urls` names
/// more endpoints, in which case they are chained in order. Every link in the
/// chain is a real backend, so a dead chain surfaces its last error.
pub fn build_invoker(config: &AppConfig) -> Result<Arc<dyn ModelInvoker>> {
    let invoker: Arc<dyn ModelInvoker> = match config.invoker.kind.as_str() {
        "echo" => Arc::new(EchoInvoker),
        "openai_compat" => {
            let api_key = config.invoker.api_key.clone().ok_or_else(|| {
                InvokeError::NotConfigured(
                    "openai_compat invoker needs an API key (AMPLIFAI_API_KEY)".into(),
                )
            })?;
            let timeout = Duration::from_secs(config.invoker.timeout_secs);
            let primary =
                OpenAiCompatInvoker::with_timeout("openai_compat", &config.invoker.base_url, api_key.clone(), timeout)?;

            if config.invoker.fallback_base_urls.is_empty() {
                Arc::new(primary)
            } else {
                let mut chain = FallbackInvoker::new("openai_compat+fallback").add(Arc::new(primary), timeout);
                for (i, url) in config.invoker.fallback_base_urls.iter().enumerate() {
                    let backup = OpenAiCompatInvoker::with_timeout(
                        format!("openai_compat#{}", i + 1),
                        url,
                        api_key.clone(),
                        timeout,
                    )?;
                    chain = chain.add(Arc::new(backup), timeout);
                }
                Arc::new(chain)
            }
        }
        other => {
            return Err(InvokeError::NotConfigured(format!("unknown invoker kind '{other}'")).into());
        }
    };

    info!(invoker = invoker.name(), "Model invoker ready");
    Ok(invoker)
}
