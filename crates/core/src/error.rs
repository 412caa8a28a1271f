//! Error types for the Amplifai domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! One tagged enum is the whole failure surface; each bounded context
//! contributes its own nested error.

use thiserror::Error;

/// The top-level error type for all Amplifai operations.
#[derive(Debug, Error)]
pub enum AmplifaiError {
    // --- Model selection ---
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    // --- Registry ---
    #[error("Invalid model name: {0:?}")]
    InvalidModelName(String),

    #[error("Model already registered: {0}")]
    DuplicateModel(String),

    // --- External model invocation ---
    #[error("Invocation error: {0}")]
    Invocation(#[from] InvokeError),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AmplifaiError {
    /// Whether this error came from model selection.
    pub fn is_selection(&self) -> bool {
        matches!(self, AmplifaiError::Selection(_))
    }
}

/// Result type alias using our error.
pub type Result<T> = std::result::Result<T, AmplifaiError>;

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no models registered (task type: {task_type:?})")]
    EmptyRegistry { task_type: String },

    #[error("policy '{policy}' matched no model (task type: {task_type:?})")]
    NoMatch { task_type: String, policy: String },
}

#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invoker not configured: {0}")]
    NotConfigured(String),
}
