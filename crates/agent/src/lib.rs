//! Agents for Amplifai.
//!
//! An agent turns an input into a response by reading shared context,
//! classifying the input into a task type, asking the ensemble for a model
//! and handing generation to a `ModelInvoker`. See [`EnsembleAgent`] for the
//! turn sequence.

pub mod ensemble_agent;
pub mod prompt;
pub mod task;

pub use ensemble_agent::{EnsembleAgent, USER_SOURCE};
pub use prompt::{DEFAULT_SYSTEM_PROMPT, format_context_block, render_system_prompt};
pub use task::{FixedClassifier, KeywordClassifier, TaskClassifier, TaskRule};
