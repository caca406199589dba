//! Model invoker implementations for agentloop.
//!
//! All invokers implement the `agentloop_core::ModelInvoker` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatInvoker;
