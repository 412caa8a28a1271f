//! Invoker fallback — ordered retry chain with per-entry timeouts.
//!
//! Retrying belongs to the invocation layer, not to model selection: the
//! agent fails fast on an empty ensemble, while a flaky backend can be
//! papered over here by trying the next invoker in line.

use std::sync::Arc;
use std::time::Duration;

use amplifai_core::error::InvokeError;
use amplifai_core::invoker::{InvocationRequest, InvocationResponse, ModelInvoker};
use async_trait::async_trait;
use tracing::{info, warn};

/// An invoker that tries an ordered list of invokers until one answers.
pub struct FallbackInvoker {
    name: String,
    chain: Vec<FallbackEntry>,
}

struct FallbackEntry {
    invoker: Arc<dyn ModelInvoker>,
    timeout: Duration,
}

impl FallbackInvoker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Append an invoker with its own timeout.
    pub fn add(mut self, invoker: Arc<dyn ModelInvoker>, timeout: Duration) -> Self {
        self.chain.push(FallbackEntry { invoker, timeout });
        self
    }

    /// Append an invoker with the default timeout (120s).
    pub fn add_default(self, invoker: Arc<dyn ModelInvoker>) -> Self {
        self.add(invoker, Duration::from_secs(120))
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[async_trait]
impl ModelInvoker for FallbackInvoker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        request: InvocationRequest,
    ) -> std::result::Result<InvocationResponse, InvokeError> {
        let mut last_error = InvokeError::NotConfigured("No invokers in fallback chain".into());

        for (i, entry) in self.chain.iter().enumerate() {
            let invoker_name = entry.invoker.name();

            info!(
                invoker = %invoker_name,
                attempt = i + 1,
                total = self.chain.len(),
                "Fallback: trying invoker"
            );

            match tokio::time::timeout(entry.timeout, entry.invoker.invoke(request.clone())).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => {
                    warn!(invoker = %invoker_name, error = %e, "Fallback: invoker failed, trying next");
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        invoker = %invoker_name,
                        timeout_ms = entry.timeout.as_millis() as u64,
                        "Fallback: invoker timed out, trying next"
                    );
                    last_error = InvokeError::Timeout(format!(
                        "Invoker '{}' timed out after {}ms",
                        invoker_name,
                        entry.timeout.as_millis()
                    ));
                }
            }
        }

        Err(last_error)
    }

    async fn health_check(&self) -> std::result::Result<bool, InvokeError> {
        for entry in &self.chain {
            if let Ok(true) = entry.invoker.health_check().await {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::EchoInvoker;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails every call with a fixed error, counting attempts.
    struct Broken {
        error: InvokeError,
        calls: AtomicUsize,
    }

    impl Broken {
        fn new(error: InvokeError) -> Self {
            Self {
                error,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelInvoker for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn invoke(
            &self,
            _request: InvocationRequest,
        ) -> std::result::Result<InvocationResponse, InvokeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }

        async fn health_check(&self) -> std::result::Result<bool, InvokeError> {
            Err(self.error.clone())
        }
    }

    /// Never answers.
    struct Stalled;

    #[async_trait]
    impl ModelInvoker for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn invoke(
            &self,
            _request: InvocationRequest,
        ) -> std::result::Result<InvocationResponse, InvokeError> {
            std::future::pending().await
        }
    }

    fn request() -> InvocationRequest {
        InvocationRequest::new("gpt-mini", "hello")
    }

    #[tokio::test]
    async fn first_healthy_invoker_answers() {
        let fallback = FallbackInvoker::new("chain")
            .add_default(Arc::new(EchoInvoker))
            .add_default(Arc::new(Broken::new(InvokeError::Network("down".into()))));

        let resp = fallback.invoke(request()).await.unwrap();
        assert_eq!(resp.output, "[gpt-mini] hello");
    }

    #[tokio::test]
    async fn falls_through_to_next_on_error() {
        let primary = Arc::new(Broken::new(InvokeError::RateLimited {
            retry_after_secs: 60,
        }));
        let fallback = FallbackInvoker::new("chain")
            .add_default(primary.clone())
            .add_default(Arc::new(EchoInvoker));

        let resp = fallback.invoke(request()).await.unwrap();
        assert_eq!(resp.model, "gpt-mini");
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn reports_last_error_when_all_fail() {
        let a = Arc::new(Broken::new(InvokeError::Network("refused".into())));
        let b = Arc::new(Broken::new(InvokeError::AuthenticationFailed("bad key".into())));
        let fallback = FallbackInvoker::new("chain")
            .add_default(a.clone())
            .add_default(b.clone());

        let err = fallback.invoke(request()).await.unwrap_err();
        assert!(matches!(err, InvokeError::AuthenticationFailed(_)));
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn stalled_invoker_times_out() {
        let fallback = FallbackInvoker::new("chain")
            .add(Arc::new(Stalled), Duration::from_millis(20))
            .add_default(Arc::new(EchoInvoker));

        let resp = fallback.invoke(request()).await.unwrap();
        assert_eq!(resp.output, "[gpt-mini] hello");

        let only_stalled = FallbackInvoker::new("chain").add(Arc::new(Stalled), Duration::from_millis(20));
        let err = only_stalled.invoke(request()).await.unwrap_err();
        assert!(matches!(err, InvokeError::Timeout(_)));
    }

    #[tokio::test]
    async fn empty_chain_is_not_configured() {
        let fallback = FallbackInvoker::new("empty");
        assert!(fallback.is_empty());
        let err = fallback.invoke(request()).await.unwrap_err();
        assert!(matches!(err, InvokeError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn healthy_if_any_entry_is_healthy() {
        let fallback = FallbackInvoker::new("chain")
            .add_default(Arc::new(Broken::new(InvokeError::Network("down".into()))))
            .add_default(Arc::new(EchoInvoker));
        assert_eq!(fallback.len(), 2);
        assert!(fallback.health_check().await.unwrap());
    }
}
