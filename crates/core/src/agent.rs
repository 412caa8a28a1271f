//! The agent capability and its runtime state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Anything that can turn an input string into a response.
///
/// Implementations decide how context is read, how a task type is inferred
/// and which model answers. Callers only see `respond`, so one agent variant
/// substitutes for another. A CLI or a batch job can hold
/// an `Arc<dyn Agent>` without knowing what is behind it.
///
/// A model-selection failure must surface as an error, never as an empty or
/// degraded response.
#[async_trait]
pub trait Agent: Send + Sync {
    /// A human-readable name for this agent (used as the context source tag).
    fn name(&self) -> &str;

    /// Produce a response for `input`. Empty input is allowed.
    async fn respond(&self, input: &str) -> Result<String>;
}

/// Runtime counters for an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    /// Calls to `respond` that returned a response
    pub requests_processed: u64,

    /// Calls to `respond` that returned an error
    pub requests_failed: u64,

    /// Total tokens reported by the invoker since startup
    pub total_tokens: u64,
}
