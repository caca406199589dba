//! Error types for the agentloop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// The top-level error type for core operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model invoker errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Message log invariant ---
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the model invoker. These are the only errors the
/// conversation loop does not recover from.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Tool registry and execution errors.
///
/// Everything except `Duplicate` is recoverable per invocation: the executor
/// turns it into a tool-role message starting with `"Error:"`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("unknown tool {0}")]
    Unknown(String),

    #[error("tool {0} is already registered")]
    Duplicate(String),

    #[error("invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    /// The handler itself failed; the message is surfaced verbatim.
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    /// Shorthand for a handler failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A message log that breaks the invocation/result pairing rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("tool message at index {index} has no tool_invocation_id")]
    MissingInvocationId { index: usize },

    #[error("tool message at index {index} answers unknown or already answered invocation {id}")]
    UnmatchedToolResult { index: usize, id: String },

    #[error("invocation id {id} is used more than once (message index {index})")]
    DuplicateInvocationId { index: usize, id: String },
}
