//! Tool executor: turns one assistant message's invocations into tool
//! messages.
//!
//! Every failure below the model (unknown tool, malformed arguments, a
//! failing or panicking handler) is contained here and becomes a tool
//! message whose content starts with `"Error:"`. Results are appended in
//! invocation order, whatever order they complete in.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use agentloop_core::error::ToolError;
use agentloop_core::event::{DomainEvent, EventBus};
use agentloop_core::message::{Conversation, Message, ToolInvocation};
use agentloop_core::tool::ToolRegistry;
use chrono::Utc;
use futures::FutureExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How the invocations of one round are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One after another; cancellation is checked between invocations.
    #[default]
    Sequential,
    /// All at once; results are still appended in invocation order.
    Concurrent,
}

/// The result of executing one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub invocation_id: String,
    pub tool_name: String,
    pub content: String,
    pub success: bool,
    pub duration_ms: u64,
}

impl ToolOutcome {
    /// Wrap the outcome as a tool-role message answering its invocation.
    pub fn to_message(&self) -> Message {
        Message::tool_result(&self.invocation_id, &self.content)
    }
}

/// Raised when the cancellation token fires during a tool pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionCancelled {
    /// How many results were appended before stopping.
    pub completed: usize,
}

/// Executes tool invocations against a shared registry.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    mode: ExecutionMode,
    event_bus: Option<Arc<EventBus>>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            mode: ExecutionMode::Sequential,
            event_bus: None,
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Publish a `ToolExecuted` event per invocation.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Run one invocation. Never fails: errors become `"Error: ..."` content.
    pub async fn execute_one(&self, invocation: &ToolInvocation) -> ToolOutcome {
        let start = Instant::now();
        let result = AssertUnwindSafe(self.try_execute(invocation))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(ToolError::failed(format!("tool {} panicked", invocation.name))));
        let duration_ms = start.elapsed().as_millis() as u64;

        let (content, success) = match result {
            Ok(output) => (output, true),
            Err(e) => {
                warn!(tool = %invocation.name, id = %invocation.id, error = %e, "Tool invocation failed");
                (format!("Error: {e}"), false)
            }
        };

        ToolOutcome {
            invocation_id: invocation.id.clone(),
            tool_name: invocation.name.clone(),
            content,
            success,
            duration_ms,
        }
    }

    async fn try_execute(&self, invocation: &ToolInvocation) -> Result<String, ToolError> {
        let tool = self.registry.resolve(&invocation.name)?;

        let arguments = parse_arguments(&invocation.arguments).map_err(|reason| {
            ToolError::InvalidArguments {
                tool_name: invocation.name.clone(),
                reason,
            }
        })?;

        tool.schema
            .validate_arguments(&arguments)
            .map_err(|reason| ToolError::InvalidArguments {
                tool_name: invocation.name.clone(),
                reason,
            })?;

        debug!(tool = %invocation.name, id = %invocation.id, "Invoking tool");
        tool.handler.call(arguments).await
    }

    /// Execute a round and append one tool message per invocation to the
    /// conversation, in invocation order.
    ///
    /// On cancellation the results appended so far stay in the log.
    pub async fn execute_round(
        &self,
        invocations: &[ToolInvocation],
        conversation: &mut Conversation,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolOutcome>, ExecutionCancelled> {
        if cancel.is_cancelled() {
            return Err(ExecutionCancelled { completed: 0 });
        }

        let outcomes = match self.mode {
            ExecutionMode::Concurrent if invocations.len() > 1 => {
                let futures = invocations.iter().map(|inv| self.execute_one(inv));
                let outcomes = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ExecutionCancelled { completed: 0 }),
                    outcomes = futures::future::join_all(futures) => outcomes,
                };
                for outcome in &outcomes {
                    self.record(conversation, outcome);
                }
                outcomes
            }
            _ => {
                let mut outcomes = Vec::with_capacity(invocations.len());
                for inv in invocations {
                    if cancel.is_cancelled() {
                        return Err(ExecutionCancelled {
                            completed: outcomes.len(),
                        });
                    }
                    let outcome = self.execute_one(inv).await;
                    self.record(conversation, &outcome);
                    outcomes.push(outcome);
                }
                outcomes
            }
        };

        Ok(outcomes)
    }

    fn record(&self, conversation: &mut Conversation, outcome: &ToolOutcome) {
        conversation.push(outcome.to_message());
        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ToolExecuted {
                conversation_id: conversation.id.to_string(),
                invocation_id: outcome.invocation_id.clone(),
                tool_name: outcome.tool_name.clone(),
                success: outcome.success,
                duration_ms: outcome.duration_ms,
                timestamp: Utc::now(),
            });
        }
    }
}

/// Parse the serialized argument payload. A blank payload means `{}`.
fn parse_arguments(raw: &str) -> Result<Value, String> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw).map_err(|e| format!("malformed JSON: {e}"))
}
