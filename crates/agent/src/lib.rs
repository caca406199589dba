//! The conversation loop of agentloop.
//!
//! A conversation alternates between two steps:
//!
//! 1. **Ask the model** with the full message log and the bound tool schemas
//! 2. **If tools were requested**: execute them, append one result per
//!    invocation, and go back to step 1
//!
//! It ends when the model answers without requesting tools, when the round
//! budget runs out, when the model invoker fails, or when the caller
//! cancels. Tool failures never end a conversation: they are reported back
//! to the model as tool messages starting with `"Error:"`.

pub mod executor;
pub mod loop_runner;
pub mod scripted;

pub use executor::{ExecutionCancelled, ExecutionMode, ToolExecutor, ToolOutcome};
pub use loop_runner::{AgentLoop, Completion, LoopError, LoopState, ResponseAnomaly};
pub use scripted::ScriptedInvoker;
pub use tokio_util::sync::CancellationToken;
