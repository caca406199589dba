//! Model invoker trait: the abstraction over LLM backends.
//!
//! The conversation loop only relies on this contract: given the message
//! log and the bound tool schemas, return one assistant message that either
//! requests tools or carries the final answer.
//!
//! Implementations: OpenAI-compatible HTTP client, scripted test invokers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;
use crate::tool::ToolSchema;

/// One request to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// The model to use (e.g., "gpt-4o")
    pub model: String,

    /// The full message log so far
    pub messages: Vec<Message>,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSchema>,

    /// Temperature (0.0 = deterministic)
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// The model's reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The model invoker contract.
///
/// Errors returned here end the conversation: the loop cannot make
/// progress without the model. Timeouts belong to the implementation's
/// HTTP client and surface as [`ProviderError::Timeout`].
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// A human-readable name (e.g., "openai", "scripted").
    fn name(&self) -> &str;

    /// Send the log and get one assistant message back.
    async fn invoke(&self, request: ModelRequest) -> Result<ModelResponse, ProviderError>;
}
