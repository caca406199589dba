//! The conversation loop controller.
//!
//! Drives one conversation through alternating model calls and tool passes
//! until the model answers in plain text, the round budget runs out, the
//! model invoker fails, or the caller cancels.

use std::collections::HashSet;
use std::sync::Arc;

use agentloop_core::error::{ProtocolViolation, ProviderError};
use agentloop_core::event::{DomainEvent, EventBus};
use agentloop_core::message::{Conversation, Message, Role, ToolInvocation};
use agentloop_core::prompt::SystemPromptBuilder;
use agentloop_core::provider::{ModelInvoker, ModelRequest, ModelResponse, Usage};
use agentloop_core::tool::{ToolRegistry, ToolSchema};
use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::executor::{ExecutionMode, ToolExecutor};

/// Where the controller currently is.
#[derive(Debug)]
pub enum LoopState {
    AwaitingModel,
    ExecutingTools(Vec<ToolInvocation>),
    Done(Completion),
    Failed(LoopError),
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    /// Content of the final assistant message
    pub answer: String,

    /// Tool rounds that were executed
    pub rounds: u32,

    /// Model calls made during this run
    pub model_calls: u32,

    /// The model still wanted tools when the round budget ran out
    pub budget_exhausted: bool,

    /// Set when the run ended on a response of neither legal shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<ResponseAnomaly>,

    /// Token usage summed over all model calls that reported it
    pub usage: Usage,
}

/// A model response that neither requests tools nor answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ResponseAnomaly {
    EmptyResponse,
    UnexpectedRole(Role),
    EmptyInvocationId { tool_name: String },
    DuplicateInvocationId(String),
}

impl std::fmt::Display for ResponseAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyResponse => write!(f, "response has neither content nor tool invocations"),
            Self::UnexpectedRole(role) => write!(f, "response has role {role}, expected assistant"),
            Self::EmptyInvocationId { tool_name } => write!(f, "invocation of {tool_name} has an empty id"),
            Self::DuplicateInvocationId(id) => write!(f, "invocation id {id} is used more than once"),
        }
    }
}

/// Terminal failures of a run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoopError {
    #[error("model invoker failed: {0}")]
    Model(#[from] ProviderError),

    #[error("conversation cancelled")]
    Cancelled,

    #[error("invalid message log: {0}")]
    InvalidLog(#[from] ProtocolViolation),
}

/// Per-run counters.
#[derive(Default)]
struct RunStats {
    rounds: u32,
    model_calls: u32,
    usage: Usage,
}

impl RunStats {
    fn record_usage(&mut self, usage: Option<&Usage>) {
        if let Some(u) = usage {
            self.usage.prompt_tokens = self.usage.prompt_tokens.saturating_add(u.prompt_tokens);
            self.usage.completion_tokens = self.usage.completion_tokens.saturating_add(u.completion_tokens);
            self.usage.total_tokens = self.usage.total_tokens.saturating_add(u.total_tokens);
        }
    }

    fn complete(&self, answer: String, budget_exhausted: bool, anomaly: Option<ResponseAnomaly>) -> Completion {
        Completion {
            answer,
            rounds: self.rounds,
            model_calls: self.model_calls,
            budget_exhausted,
            anomaly,
            usage: self.usage,
        }
    }
}

/// The loop controller. One instance can serve many conversations at once;
/// each run owns only the log it is handed.
///
/// `C` is the scenario context the system prompt is built from.
pub struct AgentLoop<C: ?Sized = ()> {
    invoker: Arc<dyn ModelInvoker>,
    executor: ToolExecutor,
    prompt: Arc<dyn SystemPromptBuilder<C>>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    /// Cap on tool rounds per run (`None` = unbounded)
    max_rounds: Option<u32>,
    event_bus: Option<Arc<EventBus>>,
}

impl<C: ?Sized> AgentLoop<C> {
    pub fn new(
        invoker: Arc<dyn ModelInvoker>,
        registry: Arc<ToolRegistry>,
        prompt: impl SystemPromptBuilder<C> + 'static,
        model: impl Into<String>,
    ) -> Self {
        Self {
            invoker,
            executor: ToolExecutor::new(registry),
            prompt: Arc::new(prompt),
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            max_rounds: None,
            event_bus: None,
        }
    }

    /// Cap the number of tool rounds per run. `0` allows a single model
    /// call and never runs tools.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.executor = self.executor.with_mode(mode);
        self
    }

    /// Publish loop and tool events on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.executor = self.executor.with_event_bus(event_bus.clone());
        self.event_bus = Some(event_bus);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn registry(&self) -> &ToolRegistry {
        self.executor.registry()
    }

    /// Run a conversation to completion.
    pub async fn run(&self, conversation: &mut Conversation, context: &C) -> Result<Completion, LoopError> {
        self.run_with_cancel(conversation, context, &CancellationToken::new())
            .await
    }

    /// Run a conversation to completion, stopping early when `cancel` fires.
    ///
    /// The system prompt is rebuilt from `context` and put at the head of
    /// the log. Everything appended before a failure stays in the log.
    pub async fn run_with_cancel(
        &self,
        conversation: &mut Conversation,
        context: &C,
        cancel: &CancellationToken,
    ) -> Result<Completion, LoopError> {
        info!(
            conversation_id = %conversation.id,
            messages = conversation.len(),
            model = %self.model,
            "Starting conversation loop"
        );

        conversation.set_system_prompt(self.prompt.build(context));

        let tools = self.executor.registry().describe_all();
        let mut stats = RunStats::default();
        let mut state = match conversation.validate() {
            Ok(()) => LoopState::AwaitingModel,
            Err(violation) => LoopState::Failed(violation.into()),
        };

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if cancel.is_cancelled() {
                        LoopState::Failed(LoopError::Cancelled)
                    } else {
                        self.call_model(conversation, &tools, &mut stats, cancel).await
                    }
                }
                LoopState::ExecutingTools(invocations) => {
                    debug!(
                        conversation_id = %conversation.id,
                        round = stats.rounds,
                        invocations = invocations.len(),
                        "Executing tool round"
                    );
                    match self.executor.execute_round(&invocations, conversation, cancel).await {
                        Ok(_) => LoopState::AwaitingModel,
                        Err(cancelled) => {
                            debug!(completed = cancelled.completed, "Tool round interrupted");
                            LoopState::Failed(LoopError::Cancelled)
                        }
                    }
                }
                LoopState::Done(completion) => {
                    info!(
                        conversation_id = %conversation.id,
                        rounds = completion.rounds,
                        model_calls = completion.model_calls,
                        budget_exhausted = completion.budget_exhausted,
                        "Conversation finished"
                    );
                    self.publish_finished(conversation, true, completion.rounds);
                    return Ok(completion);
                }
                LoopState::Failed(error) => {
                    warn!(conversation_id = %conversation.id, error = %error, "Conversation failed");
                    self.publish_finished(conversation, false, stats.rounds);
                    return Err(error);
                }
            };
        }
    }

    async fn call_model(
        &self,
        conversation: &mut Conversation,
        tools: &[ToolSchema],
        stats: &mut RunStats,
        cancel: &CancellationToken,
    ) -> LoopState {
        let request = ModelRequest {
            model: self.model.clone(),
            messages: conversation.messages.clone(),
            tools: tools.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            conversation_id = %conversation.id,
            call = stats.model_calls + 1,
            invoker = self.invoker.name(),
            "Calling model"
        );
        stats.model_calls += 1;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return LoopState::Failed(LoopError::Cancelled),
            response = self.invoker.invoke(request) => response,
        };

        match response {
            Ok(response) => self.on_response(conversation, response, stats),
            Err(e) => LoopState::Failed(LoopError::Model(e)),
        }
    }

    /// Classify a model response and append it to the log.
    fn on_response(&self, conversation: &mut Conversation, response: ModelResponse, stats: &mut RunStats) -> LoopState {
        stats.record_usage(response.usage.as_ref());
        let message = response.message;

        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ModelResponded {
                conversation_id: conversation.id.to_string(),
                round: stats.rounds,
                model: response.model.clone(),
                tool_invocations: message.tool_invocations.len(),
                tokens_used: response.usage.map(|u| u.total_tokens),
                timestamp: Utc::now(),
            });
        }

        if let Some(anomaly) = detect_anomaly(conversation, &message) {
            warn!(conversation_id = %conversation.id, anomaly = %anomaly, "Model response anomaly, ending conversation");
            if let Some(bus) = &self.event_bus {
                bus.publish(DomainEvent::AnomalyDetected {
                    conversation_id: conversation.id.to_string(),
                    description: anomaly.to_string(),
                    timestamp: Utc::now(),
                });
            }
            // Only the empty answer keeps the log well formed.
            if anomaly == ResponseAnomaly::EmptyResponse {
                conversation.push(message);
            }
            return LoopState::Done(stats.complete(String::new(), false, Some(anomaly)));
        }

        if !message.requests_tools() {
            let answer = message.content.clone();
            conversation.push(message);
            return LoopState::Done(stats.complete(answer, false, None));
        }

        if self.max_rounds.is_some_and(|max| stats.rounds >= max) {
            warn!(
                conversation_id = %conversation.id,
                rounds = stats.rounds,
                "Round budget exhausted, tools of this round are not run"
            );
            let answer = message.content.clone();
            conversation.push(message);
            return LoopState::Done(stats.complete(answer, true, None));
        }

        stats.rounds += 1;
        let invocations = message.tool_invocations.clone();
        conversation.push(message);
        LoopState::ExecutingTools(invocations)
    }

    fn publish_finished(&self, conversation: &Conversation, succeeded: bool, rounds: u32) {
        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ConversationFinished {
                conversation_id: conversation.id.to_string(),
                succeeded,
                rounds,
                timestamp: Utc::now(),
            });
        }
    }
}

/// Classify a response that is neither a plain answer nor a well-formed
/// tool request.
fn detect_anomaly(conversation: &Conversation, message: &Message) -> Option<ResponseAnomaly> {
    if message.role != Role::Assistant {
        return Some(ResponseAnomaly::UnexpectedRole(message.role));
    }
    if message.tool_invocations.is_empty() && message.content.trim().is_empty() {
        return Some(ResponseAnomaly::EmptyResponse);
    }

    let mut seen: HashSet<&str> = conversation
        .messages
        .iter()
        .flat_map(|m| m.tool_invocations.iter().map(|inv| inv.id.as_str()))
        .collect();
    message.tool_invocations.iter().find_map(|inv| {
        if inv.id.is_empty() {
            Some(ResponseAnomaly::EmptyInvocationId {
                tool_name: inv.name.clone(),
            })
        } else if !seen.insert(inv.id.as_str()) {
            Some(ResponseAnomaly::DuplicateInvocationId(inv.id.clone()))
        } else {
            None
        }
    })
}
