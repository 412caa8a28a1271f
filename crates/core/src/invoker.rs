//! Model invocation — the boundary to whatever actually generates text.
//!
//! The agent hands an [`InvocationRequest`] to a [`ModelInvoker`] and gets
//! an [`InvocationResponse`] back. Transport, retries and timeouts are the
//! invoker's business; nothing in the core waits on I/O.
//!
//! Implementations: echo (offline), OpenAI-compatible HTTP, fallback chain.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::InvokeError;

/// Everything a backend needs to generate one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// The selected model (e.g., "gpt-mini")
    pub model: String,

    /// Instructions, with prior context already rendered in
    #[serde(default)]
    pub system_prompt: String,

    /// Prior context entries, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,

    /// The new input to answer
    pub input: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl InvocationRequest {
    /// A request with default sampling settings and no context.
    pub fn new(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: String::new(),
            context: Vec::new(),
            input: input.into(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

/// A complete response from a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationResponse {
    /// The generated text
    pub output: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The external generation capability.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// A human-readable name for this invoker (e.g., "echo", "openai").
    fn name(&self) -> &str;

    /// Generate a response for the request.
    async fn invoke(
        &self,
        request: InvocationRequest,
    ) -> std::result::Result<InvocationResponse, InvokeError>;

    /// Health check — can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, InvokeError> {
        Ok(true)
    }
}
