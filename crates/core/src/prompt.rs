//! System prompt builders.
//!
//! Every run rebuilds the system prompt from the conversation state the
//! caller supplies, so a scenario can embed its context record (an order,
//! an incident) without the loop knowing its shape.

/// Builds the system prompt for one run from the caller's context.
pub trait SystemPromptBuilder<C: ?Sized>: Send + Sync {
    fn build(&self, context: &C) -> String;
}

impl<C: ?Sized, F> SystemPromptBuilder<C> for F
where
    F: Fn(&C) -> String + Send + Sync,
{
    fn build(&self, context: &C) -> String {
        self(context)
    }
}

/// A fixed prompt that ignores the context.
#[derive(Debug, Clone, Default)]
pub struct StaticPrompt(pub String);

impl StaticPrompt {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self(prompt.into())
    }
}

impl<C: ?Sized> SystemPromptBuilder<C> for StaticPrompt {
    fn build(&self, _context: &C) -> String {
        self.0.clone()
    }
}
