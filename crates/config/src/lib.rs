//! Configuration loading, validation, and management for Amplifai.
//!
//! Loads configuration from `~/.amplifai/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.amplifai/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Models registered in the ensemble, in registration order
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,

    /// Selection and registry policies
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Agent behavior
    #[serde(default)]
    pub agent: AgentSettings,

    /// Model invocation backend
    #[serde(default)]
    pub invoker: InvokerConfig,
}

fn default_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig {
            name: "gpt-4o-mini".into(),
            tags: vec!["chat".into(), "summarize".into()],
        },
        ModelConfig {
            name: "gpt-4o".into(),
            tags: vec!["analysis".into(), "code".into(), "planning".into()],
        },
    ]
}

/// One `[[models]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,

    /// Task types this model serves
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// "first_registered" or "capability"
    #[serde(default = "default_policy")]
    pub policy: String,

    /// "allow", "ignore", or "reject"
    #[serde(default = "default_duplicates")]
    pub duplicates: String,
}

fn default_policy() -> String {
    "first_registered".into()
}
fn default_duplicates() -> String {
    "allow".into()
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            duplicates: default_duplicates(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Overrides the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Record the generated output into context after each turn
    #[serde(default = "default_true")]
    pub record_output: bool,

    /// Only the most recent N entries are sent to the model (all if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<usize>,

    /// Task type used when no rule matches
    #[serde(default = "default_task_type")]
    pub default_task_type: String,

    /// Keyword rules, checked in order (built-in rules when empty)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task_rules: Vec<TaskRuleConfig>,
}

fn default_agent_name() -> String {
    "amplifai".into()
}
fn default_task_type() -> String {
    "chat".into()
}
fn default_true() -> bool {
    true
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            system_prompt: None,
            record_output: true,
            context_window: None,
            default_task_type: default_task_type(),
            task_rules: Vec::new(),
        }
    }
}

/// One `[[agent.task_rules]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRuleConfig {
    pub task_type: String,
    pub keywords: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct InvokerConfig {
    /// "echo" or "openai_compat"
    #[serde(default = "default_invoker_kind")]
    pub kind: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra OpenAI-compatible endpoints tried in order when `base_url` fails.
    /// They share `api_key` and `timeout_secs`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_base_urls: Vec<String>,
}

fn default_invoker_kind() -> String {
    "echo".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            kind: default_invoker_kind(),
            base_url: default_base_url(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            fallback_base_urls: Vec::new(),
        }
    }
}

impl std::fmt::Debug for InvokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvokerConfig")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("fallback_base_urls", &self.fallback_base_urls)
            .finish()
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl AppConfig {
    /// Load configuration from the default location.
    ///
    /// Environment variables take priority over the file:
    /// - `AMPLIFAI_API_KEY`, then `OPENAI_API_KEY` (only if no key is configured)
    /// - `AMPLIFAI_BASE_URL`
    /// - `AMPLIFAI_INVOKER`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            models = config.models.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if self.invoker.api_key.is_none() {
            self.invoker.api_key = std::env::var("AMPLIFAI_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(url) = std::env::var("AMPLIFAI_BASE_URL") {
            self.invoker.base_url = url;
        }

        if let Ok(kind) = std::env::var("AMPLIFAI_INVOKER") {
            self.invoker.kind = kind;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".amplifai")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.invoker.temperature) {
            return Err(ConfigError::ValidationError(
                "invoker.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !matches!(self.selection.policy.as_str(), "first_registered" | "capability") {
            return Err(ConfigError::ValidationError(format!(
                "unknown selection.policy '{}' (expected first_registered or capability)",
                self.selection.policy
            )));
        }

        if !matches!(self.selection.duplicates.as_str(), "allow" | "ignore" | "reject") {
            return Err(ConfigError::ValidationError(format!(
                "unknown selection.duplicates '{}' (expected allow, ignore or reject)",
                self.selection.duplicates
            )));
        }

        if !matches!(self.invoker.kind.as_str(), "echo" | "openai_compat") {
            return Err(ConfigError::ValidationError(format!(
                "unknown invoker.kind '{}' (expected echo or openai_compat)",
                self.invoker.kind
            )));
        }

        if let Some(model) = self.models.iter().find(|m| m.name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "model names must not be blank (got {:?})",
                model.name
            )));
        }

        if self.invoker.fallback_base_urls.iter().any(|u| u.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "invoker.fallback_base_urls must not contain blank entries".into(),
            ));
        }

        if self.agent.context_window == Some(0) {
            return Err(ConfigError::ValidationError(
                "agent.context_window must be at least 1 when set".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.invoker.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            selection: SelectionConfig::default(),
            agent: AgentSettings::default(),
            invoker: InvokerConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
