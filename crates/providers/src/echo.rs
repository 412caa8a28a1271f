//! Echo invoker — answers without leaving the process.
//!
//! Handy for offline runs and for wiring tests: the output names the model
//! that was selected, so selection is visible end to end.

use amplifai_core::error::InvokeError;
use amplifai_core::invoker::{InvocationRequest, InvocationResponse, ModelInvoker, Usage};
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct EchoInvoker;

impl EchoInvoker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ModelInvoker for EchoInvoker {
    fn name(&self) -> &str {
        "echo"
    }

    async fn invoke(
        &self,
        request: InvocationRequest,
    ) -> std::result::Result<InvocationResponse, InvokeError> {
        debug!(model = %request.model, context = request.context.len(), "Echoing input");

        let output = format!("[{}] {}", request.model, request.input);
        let prompt_tokens = word_count(&request.system_prompt) + word_count(&request.input);
        let completion_tokens = word_count(&output);

        Ok(InvocationResponse {
            output,
            model: request.model,
            usage: Some(Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        })
    }
}

fn word_count(s: &str) -> u32 {
    s.split_whitespace().count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_model_and_input() {
        let resp = EchoInvoker
            .invoke(InvocationRequest::new("gpt-mini", "hello there"))
            .await
            .unwrap();
        assert_eq!(resp.output, "[gpt-mini] hello there");
        assert_eq!(resp.model, "gpt-mini");
    }

    #[tokio::test]
    async fn empty_input_still_answers() {
        let resp = EchoInvoker
            .invoke(InvocationRequest::new("gpt-mini", ""))
            .await
            .unwrap();
        assert_eq!(resp.output, "[gpt-mini] ");
        let usage = resp.usage.unwrap();
        assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
    }
}
