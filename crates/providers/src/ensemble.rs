//! Model ensemble — the registry of candidate models and the policy that
//! picks one per task type.
//!
//! Selection reads a consistent snapshot of the registry under a read lock
//! and never mutates it. The lock is released before the caller goes on to
//! invoke the chosen model.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use amplifai_core::error::{AmplifaiError, Result, SelectionError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::selection::{FirstRegistered, SelectionPolicy};

/// A registered backend model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Opaque model identifier (e.g., "gpt-4o-mini")
    pub name: String,

    /// Task types this model serves
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this model is tagged for `task_type`.
    pub fn serves(&self, task_type: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(task_type))
    }
}

/// What `add_model` does with a name that is already registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Register it again (default)
    #[default]
    Allow,
    /// Keep the first registration, silently skip the new one
    Ignore,
    /// Fail with `AmplifaiError::DuplicateModel`
    Reject,
}

impl DuplicatePolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "allow" => Some(Self::Allow),
            "ignore" => Some(Self::Ignore),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Registry of models plus a selection policy.
pub struct ModelEnsemble {
    models: RwLock<Vec<ModelDescriptor>>,
    policy: Arc<dyn SelectionPolicy>,
    duplicates: DuplicatePolicy,
}

impl ModelEnsemble {
    /// An empty ensemble that selects the first registered model.
    pub fn new() -> Self {
        Self {
            models: RwLock::new(Vec::new()),
            policy: Arc::new(FirstRegistered),
            duplicates: DuplicatePolicy::Allow,
        }
    }

    /// Replace the selection policy.
    pub fn with_policy(mut self, policy: Arc<dyn SelectionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Set how duplicate registrations are handled.
    pub fn with_duplicate_policy(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    // Registrations are pushed whole, so a poisoned lock still guards a
    // consistent list.
    fn read(&self) -> RwLockReadGuard<'_, Vec<ModelDescriptor>> {
        self.models.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ModelDescriptor>> {
        self.models.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a model with no capability tags.
    pub fn add_model(&self, model_name: impl Into<String>) -> Result<()> {
        self.register(ModelDescriptor::new(model_name))
    }

    /// Register a model tagged with the task types it serves.
    pub fn add_model_with_tags<I, S>(&self, model_name: impl Into<String>, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(ModelDescriptor::new(model_name).with_tags(tags))
    }

    /// Register a descriptor, applying the duplicate policy.
    pub fn register(&self, descriptor: ModelDescriptor) -> Result<()> {
        if descriptor.name.trim().is_empty() {
            return Err(AmplifaiError::InvalidModelName(descriptor.name));
        }

        let mut models = self.write();
        if models.iter().any(|m| m.name == descriptor.name) {
            match self.duplicates {
                DuplicatePolicy::Allow => {}
                DuplicatePolicy::Ignore => {
                    debug!(model = %descriptor.name, "Model already registered, ignoring");
                    return Ok(());
                }
                DuplicatePolicy::Reject => {
                    return Err(AmplifaiError::DuplicateModel(descriptor.name));
                }
            }
        }

        debug!(model = %descriptor.name, tags = ?descriptor.tags, "Registered model");
        models.push(descriptor);
        Ok(())
    }

    /// Pick the model for `task_type`.
    ///
    /// Fails with `SelectionError::EmptyRegistry` when nothing is registered.
    /// Same registry + same task type always gives the same answer.
    pub fn select_model(&self, task_type: &str) -> Result<String> {
        let models = self.read();

        if models.is_empty() {
            warn!(task_type, "Model selection failed: no models registered");
            return Err(SelectionError::EmptyRegistry {
                task_type: task_type.to_string(),
            }
            .into());
        }

        let Some(index) = self.policy.select(&models, task_type) else {
            warn!(task_type, policy = self.policy.name(), "Selection policy matched no model");
            return Err(SelectionError::NoMatch {
                task_type: task_type.to_string(),
                policy: self.policy.name().to_string(),
            }
            .into());
        };

        let name = models[index].name.clone();
        debug!(task_type, model = %name, policy = self.policy.name(), "Selected model");
        Ok(name)
    }

    /// Snapshot of the registry in registration order.
    pub fn models(&self) -> Vec<ModelDescriptor> {
        self.read().clone()
    }

    /// Snapshot of the registered names in registration order.
    pub fn model_names(&self) -> Vec<String> {
        self.read().iter().map(|m| m.name.clone()).collect()
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Default for ModelEnsemble {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModelEnsemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEnsemble")
            .field("models", &self.model_names())
            .field("policy", &self.policy.name())
            .field("duplicates", &self.duplicates)
            .finish()
    }
}
