//! The ensemble-backed agent.
//!
//! One turn:
//!
//! 1. **Snapshot** prior context from the shared store
//! 2. **Classify** the input into a task type
//! 3. **Select** a model from the ensemble (fail fast if none)
//! 4. **Record** the input
//! 5. **Invoke** the selected model with input + prior context
//! 6. **Record** the output (unless disabled) and return it
//!
//! Store and ensemble locks are only taken inside their own synchronous
//! calls; nothing is held while the invoker is awaited.
//!
//! The snapshot (step 1) and the input append (step 4) are separate store
//! calls. When several agents share one store, another agent's entries can
//! land between them, so "prior context" is what the store held at step 1,
//! not everything that precedes this turn's input in the final record.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use amplifai_config::AppConfig;
use amplifai_core::agent::{Agent, AgentState};
use amplifai_core::error::Result;
use amplifai_core::invoker::{InvocationRequest, ModelInvoker};
use amplifai_memory::ContextMemoryManager;
use amplifai_providers::ModelEnsemble;
use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::prompt::{DEFAULT_SYSTEM_PROMPT, render_system_prompt};
use crate::task::{KeywordClassifier, TaskClassifier};

/// Source tag for recorded inputs.
pub const USER_SOURCE: &str = "user";

/// An agent that picks a model from a [`ModelEnsemble`] for every turn and
/// keeps the conversation in a [`ContextMemoryManager`].
///
/// Both stores are held through `Arc` and may be shared with other agents.
pub struct EnsembleAgent {
    id: Uuid,
    name: String,
    memory: Arc<ContextMemoryManager>,
    ensemble: Arc<ModelEnsemble>,
    invoker: Arc<dyn ModelInvoker>,
    classifier: Arc<dyn TaskClassifier>,
    system_prompt: String,
    /// Record generated output into context (input is always recorded)
    record_output: bool,
    /// Send only the most recent N entries to the model
    context_window: Option<usize>,
    temperature: f32,
    max_tokens: Option<u32>,
    requests_processed: AtomicU64,
    requests_failed: AtomicU64,
    total_tokens: AtomicU64,
}

impl EnsembleAgent {
    /// Create a new agent with keyword classification and output recording on.
    pub fn new(
        name: impl Into<String>,
        memory: Arc<ContextMemoryManager>,
        ensemble: Arc<ModelEnsemble>,
        invoker: Arc<dyn ModelInvoker>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            memory,
            ensemble,
            invoker,
            classifier: Arc::new(KeywordClassifier::default()),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            record_output: true,
            context_window: None,
            temperature: 0.7,
            max_tokens: None,
            requests_processed: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            total_tokens: AtomicU64::new(0),
        }
    }

    /// Create an agent configured from `[agent]` and `[invoker]`.
    pub fn from_config(
        config: &AppConfig,
        memory: Arc<ContextMemoryManager>,
        ensemble: Arc<ModelEnsemble>,
        invoker: Arc<dyn ModelInvoker>,
    ) -> Self {
        let mut agent = Self::new(&config.agent.name, memory, ensemble, invoker)
            .with_classifier(Arc::new(KeywordClassifier::from_settings(&config.agent)))
            .with_record_output(config.agent.record_output)
            .with_temperature(config.invoker.temperature)
            .with_max_tokens(config.invoker.max_tokens);
        if let Some(prompt) = &config.agent.system_prompt {
            agent = agent.with_system_prompt(prompt);
        }
        if let Some(window) = config.agent.context_window {
            agent = agent.with_context_window(window);
        }
        agent
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn TaskClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Enable or disable recording of generated output into context.
    pub fn with_record_output(mut self, enabled: bool) -> Self {
        self.record_output = enabled;
        self
    }

    /// Send only the last `n` context entries to the model.
    pub fn with_context_window(mut self, n: usize) -> Self {
        self.context_window = Some(n);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn memory(&self) -> &Arc<ContextMemoryManager> {
        &self.memory
    }

    pub fn ensemble(&self) -> &Arc<ModelEnsemble> {
        &self.ensemble
    }

    /// Task type this agent would use for `input`.
    pub fn task_type_for(&self, input: &str) -> String {
        self.classifier.classify(input)
    }

    /// Snapshot of the runtime counters.
    pub fn state(&self) -> AgentState {
        AgentState {
            requests_processed: self.requests_processed.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            total_tokens: self.total_tokens.load(Ordering::Relaxed),
        }
    }

    fn prior_context(&self) -> Vec<String> {
        match self.context_window {
            Some(n) => self.memory.recent(n),
            None => self.memory.get_contexts(),
        }
    }

    async fn run_turn(&self, input: &str) -> Result<String> {
        let context = self.prior_context();
        let task_type = self.classifier.classify(input);
        let model = self.ensemble.select_model(&task_type)?;

        debug!(
            agent = %self.name,
            task_type = %task_type,
            model = %model,
            context = context.len(),
            "Selected model for turn"
        );

        self.memory.add_context_from(USER_SOURCE, input);

        let request = InvocationRequest {
            model,
            system_prompt: render_system_prompt(&self.system_prompt, &context),
            context,
            input: input.to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self.invoker.invoke(request).await?;

        if let Some(usage) = &response.usage {
            self.total_tokens
                .fetch_add(u64::from(usage.total_tokens), Ordering::Relaxed);
        }

        if self.record_output {
            self.memory.add_context_from(&self.name, &response.output);
        }

        Ok(response.output)
    }
}

#[async_trait]
impl Agent for EnsembleAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(&self, input: &str) -> Result<String> {
        info!(agent = %self.name, agent_id = %self.id, "Processing input");

        match self.run_turn(input).await {
            Ok(output) => {
                self.requests_processed.fetch_add(1, Ordering::Relaxed);
                Ok(output)
            }
            Err(e) => {
                self.requests_failed.fetch_add(1, Ordering::Relaxed);
                warn!(agent = %self.name, error = %e, "Turn failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amplifai_core::error::{AmplifaiError, InvokeError, SelectionError};
    use amplifai_core::invoker::{InvocationResponse, Usage};
    use amplifai_providers::{CapabilityMatch, EchoInvoker};
    use std::sync::Mutex;

    /// Records every request it sees and answers with a fixed text.
    struct RecordingInvoker {
        reply: String,
        seen: Mutex<Vec<InvocationRequest>>,
    }

    impl RecordingInvoker {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.into(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<InvocationRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelInvoker for RecordingInvoker {
        fn name(&self) -> &str {
            "recording"
        }

        async fn invoke(
            &self,
            request: InvocationRequest,
        ) -> std::result::Result<InvocationResponse, InvokeError> {
            let model = request.model.clone();
            self.seen.lock().unwrap().push(request);
            Ok(InvocationResponse {
                output: self.reply.clone(),
                model,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
            })
        }
    }

    struct FailingInvoker;

    #[async_trait]
    impl ModelInvoker for FailingInvoker {
        fn name(&self) -> &str {
            "failing"
        }

        async fn invoke(
            &self,
            _request: InvocationRequest,
        ) -> std::result::Result<InvocationResponse, InvokeError> {
            Err(InvokeError::Network("connection refused".into()))
        }
    }

    fn ensemble_with(models: &[&str]) -> Arc<ModelEnsemble> {
        let ensemble = ModelEnsemble::new();
        for m in models {
            ensemble.add_model(*m).unwrap();
        }
        Arc::new(ensemble)
    }

    #[tokio::test]
    async fn respond_records_input_and_output() {
        let memory = Arc::new(ContextMemoryManager::new());
        let invoker = Arc::new(RecordingInvoker::new("Hello! How can I help?"));
        let agent = EnsembleAgent::new(
            "helper",
            memory.clone(),
            ensemble_with(&["gpt-mini", "gpt-large"]),
            invoker.clone(),
        );

        let out = agent.respond("hi").await.unwrap();
        assert_eq!(out, "Hello! How can I help?");
        assert_eq!(memory.get_contexts(), vec!["hi", "Hello! How can I help?"]);

        let entries = memory.entries();
        assert_eq!(entries[0].source.as_deref(), Some(USER_SOURCE));
        assert_eq!(entries[1].source.as_deref(), Some("helper"));

        let requests = invoker.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-mini");
        assert_eq!(requests[0].input, "hi");
        // The input is not part of its own prior context
        assert!(requests[0].context.is_empty());
    }

    #[tokio::test]
    async fn prior_context_reaches_the_model() {
        let memory = Arc::new(ContextMemoryManager::new());
        memory.add_context("The user's favorite color is blue");
        let invoker = Arc::new(RecordingInvoker::new("Blue!"));
        let agent = EnsembleAgent::new("helper", memory, ensemble_with(&["gpt-mini"]), invoker.clone());

        agent.respond("what is my favorite color?").await.unwrap();

        let request = &invoker.requests()[0];
        assert_eq!(request.context, vec!["The user's favorite color is blue"]);
        assert!(request.system_prompt.contains("favorite color is blue"));
        assert!(request.system_prompt.starts_with(DEFAULT_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn empty_ensemble_fails_without_touching_context() {
        let memory = Arc::new(ContextMemoryManager::new());
        let invoker = Arc::new(RecordingInvoker::new("unused"));
        let agent = EnsembleAgent::new("helper", memory.clone(), ensemble_with(&[]), invoker.clone());

        let err = agent.respond("hi").await.unwrap_err();
        assert!(matches!(
            err,
            AmplifaiError::Selection(SelectionError::EmptyRegistry { ref task_type }) if task_type == "chat"
        ));
        assert!(memory.is_empty());
        assert!(invoker.requests().is_empty());
        assert_eq!(agent.state().requests_failed, 1);
        assert_eq!(agent.state().requests_processed, 0);
    }

    #[tokio::test]
    async fn invocation_failure_propagates_and_keeps_input() {
        let memory = Arc::new(ContextMemoryManager::new());
        let agent = EnsembleAgent::new(
            "helper",
            memory.clone(),
            ensemble_with(&["gpt-mini"]),
            Arc::new(FailingInvoker),
        );

        let err = agent.respond("hi").await.unwrap_err();
        assert!(matches!(err, AmplifaiError::Invocation(InvokeError::Network(_))));
        assert_eq!(memory.get_contexts(), vec!["hi"]);
    }

    #[tokio::test]
    async fn output_recording_can_be_disabled() {
        let memory = Arc::new(ContextMemoryManager::new());
        let agent = EnsembleAgent::new(
            "helper",
            memory.clone(),
            ensemble_with(&["gpt-mini"]),
            Arc::new(RecordingInvoker::new("answer")),
        )
        .with_record_output(false);

        agent.respond("first").await.unwrap();
        agent.respond("second").await.unwrap();
        assert_eq!(memory.get_contexts(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn context_window_limits_what_the_model_sees() {
        let memory = Arc::new(ContextMemoryManager::new());
        for c in ["one", "two", "three"] {
            memory.add_context(c);
        }
        let invoker = Arc::new(RecordingInvoker::new("ok"));
        let agent = EnsembleAgent::new("helper", memory.clone(), ensemble_with(&["gpt-mini"]), invoker.clone())
            .with_context_window(2);

        agent.respond("four").await.unwrap();
        assert_eq!(invoker.requests()[0].context, vec!["two", "three"]);
        // The store itself is never trimmed
        assert_eq!(memory.len(), 5);
    }

    #[tokio::test]
    async fn task_type_drives_capability_selection() {
        let ensemble = ModelEnsemble::new().with_policy(Arc::new(CapabilityMatch));
        ensemble.add_model_with_tags("gpt-mini", ["chat"]).unwrap();
        ensemble.add_model_with_tags("coder", ["code"]).unwrap();

        let agent = EnsembleAgent::new(
            "helper",
            Arc::new(ContextMemoryManager::new()),
            Arc::new(ensemble),
            Arc::new(EchoInvoker),
        );

        assert_eq!(agent.task_type_for("fix this bug"), "code");
        assert_eq!(agent.respond("fix this bug").await.unwrap(), "[coder] fix this bug");
        assert_eq!(agent.respond("hello").await.unwrap(), "[gpt-mini] hello");
    }

    #[tokio::test]
    async fn counters_track_tokens_and_requests() {
        let agent = EnsembleAgent::new(
            "helper",
            Arc::new(ContextMemoryManager::new()),
            ensemble_with(&["gpt-mini"]),
            Arc::new(RecordingInvoker::new("ok")),
        );
        agent.respond("a").await.unwrap();
        agent.respond("b").await.unwrap();

        let state = agent.state();
        assert_eq!(state.requests_processed, 2);
        assert_eq!(state.total_tokens, 30);
    }

    #[tokio::test]
    async fn from_config_applies_agent_settings() {
        let mut config = AppConfig::default();
        config.agent.name = "configured".into();
        config.agent.system_prompt = Some("Be brief.".into());
        config.agent.record_output = false;
        config.invoker.max_tokens = 64;

        let memory = Arc::new(ContextMemoryManager::new());
        let invoker = Arc::new(RecordingInvoker::new("ok"));
        let agent = EnsembleAgent::from_config(&config, memory.clone(), ensemble_with(&["gpt-mini"]), invoker.clone());

        assert_eq!(agent.name(), "configured");
        agent.respond("hello").await.unwrap();
        assert_eq!(memory.get_contexts(), vec!["hello"]);

        let request = &invoker.requests()[0];
        assert_eq!(request.system_prompt, "Be brief.");
        assert_eq!(request.max_tokens, Some(64));
    }
}
