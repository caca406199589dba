//! A model invoker that replays scripted responses.
//!
//! Used by tests and offline demos. Every request is recorded so callers
//! can assert on what the model would have seen.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use agentloop_core::error::ProviderError;
use agentloop_core::message::{Message, ToolInvocation};
use agentloop_core::provider::{ModelInvoker, ModelRequest, ModelResponse, Usage};
use async_trait::async_trait;

type Responder = Box<dyn Fn(&ModelRequest) -> Result<ModelResponse, ProviderError> + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<Result<ModelResponse, ProviderError>>>),
    Responder(Responder),
}

/// Replays a fixed queue of responses, or computes each one from the
/// request.
pub struct ScriptedInvoker {
    script: Script,
    requests: Mutex<Vec<ModelRequest>>,
    delay: Option<Duration>,
}

impl ScriptedInvoker {
    /// Return the given results in order. Calls past the end fail.
    pub fn new(responses: Vec<Result<ModelResponse, ProviderError>>) -> Self {
        Self {
            script: Script::Queue(Mutex::new(responses.into())),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Compute every response from the incoming request.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&ModelRequest) -> Result<ModelResponse, ProviderError> + Send + Sync + 'static,
    {
        Self {
            script: Script::Responder(Box::new(responder)),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
        match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or_else(|| {
                    Err(ProviderError::MalformedResponse(
                        "scripted invoker has no responses left".into(),
                    ))
                }),
            Script::Responder(responder) => responder(request),
        }
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, request: ModelRequest) -> Result<ModelResponse, ProviderError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next(&request)
    }
}

fn scripted_usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

/// A final-answer response.
pub fn text_response(text: &str) -> ModelResponse {
    ModelResponse {
        message: Message::assistant(text),
        usage: scripted_usage(),
        model: "scripted".into(),
    }
}

/// A response that requests the given tool invocations.
pub fn tool_response(invocations: Vec<ToolInvocation>) -> ModelResponse {
    ModelResponse {
        message: Message::assistant_with_invocations("", invocations),
        usage: scripted_usage(),
        model: "scripted".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloop_core::message::Role;

    fn request(text: &str) -> ModelRequest {
        ModelRequest {
            model: "m".into(),
            messages: vec![Message::user(text)],
            tools: vec![],
            temperature: 0.0,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn replays_in_order_then_fails() {
        let invoker = ScriptedInvoker::new(vec![Ok(text_response("one")), Ok(text_response("two"))]);

        assert_eq!(invoker.invoke(request("a")).await.unwrap().message.content, "one");
        assert_eq!(invoker.invoke(request("b")).await.unwrap().message.content, "two");
        assert!(matches!(
            invoker.invoke(request("c")).await,
            Err(ProviderError::MalformedResponse(_))
        ));
        assert_eq!(invoker.calls(), 3);
        assert_eq!(invoker.requests()[1].messages[0].content, "b");
    }

    #[tokio::test]
    async fn responder_sees_the_request() {
        let invoker = ScriptedInvoker::from_fn(|req| {
            let last = req.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(text_response(&format!("echo: {last}")))
        });

        let response = invoker.invoke(request("hello")).await.unwrap();
        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.message.content, "echo: hello");
    }
}
