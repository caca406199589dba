//! # agentloop core
//!
//! Domain types, traits, and error definitions for the tool-calling
//! conversation loop. This crate has no runtime or HTTP dependencies; it
//! defines the model that the executor, the controller and the model
//! clients are written against.
//!
//! ## Pieces
//!
//! - [`message`]: the append-only message log and its pairing invariant
//! - [`tool`]: tool schemas, the `ToolHandler` trait and the `ToolRegistry`
//! - [`provider`]: the `ModelInvoker` contract the loop consumes
//! - [`prompt`]: system-prompt builders parameterised by conversation state
//! - [`event`]: broadcast domain events for observers

pub mod error;
pub mod event;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProtocolViolation, ProviderError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, ConversationId, Message, Role, ToolInvocation};
pub use prompt::{StaticPrompt, SystemPromptBuilder};
pub use provider::{ModelInvoker, ModelRequest, ModelResponse, Usage};
pub use tool::{
    FnHandler, ParamType, ParameterSpec, RegisteredTool, ToolHandler, ToolRegistry, ToolSchema,
};
