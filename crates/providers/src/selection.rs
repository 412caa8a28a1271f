//! Selection policies — how an ensemble turns a task type into one model.
//!
//! A policy is a pure function of the registry snapshot and the task type.
//! It returns the index of the chosen descriptor, or `None` when it has no
//! answer; the ensemble turns `None` into a `SelectionError`.

use std::sync::Arc;

use crate::ensemble::ModelDescriptor;

/// Strategy for picking a model out of a registry snapshot.
///
/// Implementations must be deterministic: the same slice and task type must
/// always yield the same index. `models` is never empty when called.
pub trait SelectionPolicy: Send + Sync {
    /// Policy name (used in logs and errors).
    fn name(&self) -> &str;

    /// Index into `models` of the chosen model.
    fn select(&self, models: &[ModelDescriptor], task_type: &str) -> Option<usize>;
}

/// Always the earliest-registered model; the task type is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstRegistered;

impl SelectionPolicy for FirstRegistered {
    fn name(&self) -> &str {
        "first_registered"
    }

    fn select(&self, models: &[ModelDescriptor], _task_type: &str) -> Option<usize> {
        if models.is_empty() { None } else { Some(0) }
    }
}

/// Earliest-registered model tagged with the task type, else the first model.
///
/// Tags compare ASCII case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityMatch;

impl SelectionPolicy for CapabilityMatch {
    fn name(&self) -> &str {
        "capability"
    }

    fn select(&self, models: &[ModelDescriptor], task_type: &str) -> Option<usize> {
        models
            .iter()
            .position(|m| m.serves(task_type))
            .or_else(|| FirstRegistered.select(models, task_type))
    }
}

/// A policy backed by a closure.
pub struct FnPolicy<F> {
    name: String,
    select: F,
}

impl<F> FnPolicy<F>
where
    F: Fn(&[ModelDescriptor], &str) -> Option<usize> + Send + Sync,
{
    pub fn new(name: impl Into<String>, select: F) -> Self {
        Self {
            name: name.into(),
            select,
        }
    }
}

impl<F> SelectionPolicy for FnPolicy<F>
where
    F: Fn(&[ModelDescriptor], &str) -> Option<usize> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn select(&self, models: &[ModelDescriptor], task_type: &str) -> Option<usize> {
        (self.select)(models, task_type).filter(|&i| i < models.len())
    }
}

/// Look up a built-in policy by its configuration name.
pub fn policy_from_name(name: &str) -> Option<Arc<dyn SelectionPolicy>> {
    match name {
        "first_registered" => Some(Arc::new(FirstRegistered)),
        "capability" => Some(Arc::new(CapabilityMatch)),
        _ => None,
    }
}
