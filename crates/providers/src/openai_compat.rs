//! OpenAI-compatible invoker.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM, llama.cpp, or any endpoint
//! exposing `/v1/chat/completions`.
//!
//! Prior context is already rendered into the system prompt by the agent, so
//! each invocation is a two-message exchange: system, then user.

use std::time::Duration;

use amplifai_core::error::InvokeError;
use amplifai_core::invoker::{InvocationRequest, InvocationResponse, ModelInvoker, Usage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible chat-completions client.
pub struct OpenAiCompatInvoker {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatInvoker {
    /// Create a new OpenAI-compatible invoker.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, InvokeError> {
        Self::with_timeout(name, base_url, api_key, Duration::from_secs(120))
    }

    /// Create an invoker whose HTTP client gives up after `timeout`.
    pub fn with_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InvokeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InvokeError::NotConfigured(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the chat messages for a request.
    fn to_api_messages(request: &InvocationRequest) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(2);
        if !request.system_prompt.is_empty() {
            messages.push(ApiMessage {
                role: "system".into(),
                content: Some(request.system_prompt.clone()),
            });
        }
        messages.push(ApiMessage {
            role: "user".into(),
            content: Some(request.input.clone()),
        });
        messages
    }

    fn request_body(request: &InvocationRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(request),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }
}

#[async_trait]
impl ModelInvoker for OpenAiCompatInvoker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        request: InvocationRequest,
    ) -> std::result::Result<InvocationResponse, InvokeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(invoker = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InvokeError::Timeout(e.to_string())
                } else {
                    InvokeError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(InvokeError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(InvokeError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status == 404 {
            return Err(InvokeError::ModelNotFound(request.model));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Backend returned error");
            return Err(InvokeError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| InvokeError::Api {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })?;

        parse_response(api_response)
    }

    async fn health_check(&self) -> std::result::Result<bool, InvokeError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| InvokeError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

fn parse_response(api_response: ApiResponse) -> std::result::Result<InvocationResponse, InvokeError> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| InvokeError::Api {
            status_code: 200,
            message: "No choices in response".into(),
        })?;

    let usage = api_response.usage.map(|u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(InvocationResponse {
        output: choice.message.content.unwrap_or_default(),
        model: api_response.model,
        usage,
    })
}

// --- OpenAI API wire types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_trimmed() {
        let invoker = OpenAiCompatInvoker::new("custom", "http://localhost:8000/v1/", "k").unwrap();
        assert_eq!(invoker.base_url(), "http://localhost:8000/v1");
    }

    #[test]
    fn messages_include_system_then_user() {
        let mut request = InvocationRequest::new("gpt-mini", "hi");
        request.system_prompt = "You are helpful.".into();
        let messages = OpenAiCompatInvoker::to_api_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content.as_deref(), Some("hi"));
    }

    #[test]
    fn empty_system_prompt_is_omitted() {
        let request = InvocationRequest::new("gpt-mini", "hi");
        let messages = OpenAiCompatInvoker::to_api_messages(&request);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn body_carries_max_tokens_when_set() {
        let mut request = InvocationRequest::new("gpt-mini", "hi");
        let body = OpenAiCompatInvoker::request_body(&request);
        assert!(body.get("max_tokens").is_none());
        assert_eq!(body["stream"], false);

        request.max_tokens = Some(256);
        let body = OpenAiCompatInvoker::request_body(&request);
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["model"], "gpt-mini");
    }

    #[test]
    fn parse_completion_response() {
        let raw = r#"{
            "model": "gpt-mini-2024",
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}],
            "usage": {"prompt_tokens": 9, "completion_tokens": 2, "total_tokens": 11}
        }"#;
        let api: ApiResponse = serde_json::from_str(raw).unwrap();
        let resp = parse_response(api).unwrap();
        assert_eq!(resp.output, "Hello!");
        assert_eq!(resp.model, "gpt-mini-2024");
        assert_eq!(resp.usage.unwrap().total_tokens, 11);
    }

    #[test]
    fn response_without_choices_is_an_error() {
        let api: ApiResponse =
            serde_json::from_str(r#"{"model": "m", "choices": [], "usage": null}"#).unwrap();
        assert!(matches!(parse_response(api), Err(InvokeError::Api { .. })));
    }
}
