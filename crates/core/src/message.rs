//! Message log domain types.
//!
//! A conversation is an ordered, append-only list of messages. Assistant
//! messages may carry tool invocations; tool messages answer exactly one of
//! them by id.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtocolViolation;

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The end user
    User,
    /// The model
    Assistant,
    /// Tool execution result
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        f.write_str(s)
    }
}

/// A single requested tool call, emitted by the model inside an assistant
/// message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Opaque id assigned by the model, unique within the conversation
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a serialized JSON object
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.to_string(),
        }
    }
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    #[serde(default = "new_message_id")]
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    #[serde(default)]
    pub content: String,

    /// Tool invocations requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_invocations: Vec<ToolInvocation>,

    /// If this is a tool result, which invocation it answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_invocation_id: Option<String>,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role,
            content: content.into(),
            tool_invocations: Vec::new(),
            tool_invocation_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create an assistant message that requests tool invocations.
    pub fn assistant_with_invocations(
        content: impl Into<String>,
        invocations: Vec<ToolInvocation>,
    ) -> Self {
        let mut msg = Self::with_role(Role::Assistant, content);
        msg.tool_invocations = invocations;
        msg
    }

    /// Create a tool result message.
    pub fn tool_result(tool_invocation_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_invocation_id = Some(tool_invocation_id.into());
        msg
    }

    /// Whether this is an assistant message that asks for tools.
    pub fn requests_tools(&self) -> bool {
        self.role == Role::Assistant && !self.tool_invocations.is_empty()
    }
}

/// A conversation: the message log plus bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    #[serde(default)]
    pub id: ConversationId,

    /// Ordered messages
    #[serde(default)]
    pub messages: Vec<Message>,

    /// When this conversation was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a conversation from the caller's opening user messages.
    pub fn from_user_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut conv = Self::new();
        for content in messages {
            conv.push(Message::user(content));
        }
        conv
    }

    /// Append a message to the log.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Put `prompt` at the head of the log, replacing an existing system
    /// message there.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        let system = Message::system(prompt);
        match self.messages.first() {
            Some(first) if first.role == Role::System => self.messages[0] = system,
            _ => self.messages.insert(0, system),
        }
        self.updated_at = Utc::now();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Check the pairing invariant: every tool message answers exactly one
    /// earlier, still unanswered invocation, and invocation ids are unique.
    pub fn validate(&self) -> Result<(), ProtocolViolation> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut pending: HashSet<&str> = HashSet::new();

        for (index, msg) in self.messages.iter().enumerate() {
            match msg.role {
                Role::Assistant => {
                    for inv in &msg.tool_invocations {
                        if !seen.insert(inv.id.as_str()) {
                            return Err(ProtocolViolation::DuplicateInvocationId {
                                index,
                                id: inv.id.clone(),
                            });
                        }
                        pending.insert(inv.id.as_str());
                    }
                }
                Role::Tool => {
                    let id = msg
                        .tool_invocation_id
                        .as_deref()
                        .ok_or(ProtocolViolation::MissingInvocationId { index })?;
                    if !pending.remove(id) {
                        return Err(ProtocolViolation::UnmatchedToolResult {
                            index,
                            id: id.to_string(),
                        });
                    }
                }
                Role::System | Role::User => {}
            }
        }
        Ok(())
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add_call(id: &str) -> ToolInvocation {
        ToolInvocation::new(id, "add", json!({"x": 1, "y": 2}))
    }

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
        assert!(msg.tool_invocations.is_empty());
        assert!(!msg.requests_tools());
    }

    #[test]
    fn conversation_tracks_updates() {
        let mut conv = Conversation::new();
        let created = conv.created_at;

        conv.push(Message::user("First message"));
        assert_eq!(conv.len(), 1);
        assert!(conv.updated_at >= created);
    }

    #[test]
    fn system_prompt_is_inserted_then_replaced() {
        let mut conv = Conversation::from_user_messages(["hi"]);
        conv.set_system_prompt("v1");
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages[0].content, "v1");

        conv.set_system_prompt("v2");
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages[0].role, Role::System);
        assert_eq!(conv.messages[0].content, "v2");
        assert_eq!(conv.messages[1].content, "hi");
    }

    #[test]
    fn message_deserializes_with_defaults() {
        let msg: Message = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(msg.role, Role::User);
        assert!(!msg.id.is_empty());
        assert!(msg.tool_invocation_id.is_none());
    }

    #[test]
    fn tool_fields_are_omitted_when_absent() {
        let json = serde_json::to_string(&Message::user("plain")).unwrap();
        assert!(!json.contains("tool_invocations"));
        assert!(!json.contains("tool_invocation_id"));
    }

    #[test]
    fn valid_log_passes() {
        let mut conv = Conversation::from_user_messages(["sum please"]);
        conv.push(Message::assistant_with_invocations("", vec![add_call("a"), add_call("b")]));
        conv.push(Message::tool_result("b", "3"));
        conv.push(Message::tool_result("a", "3"));
        conv.push(Message::assistant("3 and 3"));
        assert!(conv.validate().is_ok());
    }

    #[test]
    fn tool_result_for_earlier_unanswered_invocation_is_valid() {
        let mut conv = Conversation::new();
        conv.push(Message::assistant_with_invocations("", vec![add_call("a")]));
        conv.push(Message::assistant_with_invocations("", vec![add_call("b")]));
        conv.push(Message::tool_result("a", "3"));
        conv.push(Message::tool_result("b", "3"));
        assert!(conv.validate().is_ok());
    }

    #[test]
    fn unmatched_tool_result_is_rejected() {
        let mut conv = Conversation::from_user_messages(["hi"]);
        conv.push(Message::tool_result("ghost", "boo"));
        assert_eq!(
            conv.validate(),
            Err(ProtocolViolation::UnmatchedToolResult {
                index: 1,
                id: "ghost".into()
            })
        );
    }

    #[test]
    fn answering_twice_is_rejected() {
        let mut conv = Conversation::new();
        conv.push(Message::assistant_with_invocations("", vec![add_call("a")]));
        conv.push(Message::tool_result("a", "3"));
        conv.push(Message::tool_result("a", "3"));
        assert!(matches!(
            conv.validate(),
            Err(ProtocolViolation::UnmatchedToolResult { index: 2, .. })
        ));
    }

    #[test]
    fn reused_invocation_id_is_rejected() {
        let mut conv = Conversation::new();
        conv.push(Message::assistant_with_invocations("", vec![add_call("a")]));
        conv.push(Message::tool_result("a", "3"));
        conv.push(Message::assistant_with_invocations("", vec![add_call("a")]));
        assert!(matches!(
            conv.validate(),
            Err(ProtocolViolation::DuplicateInvocationId { index: 2, .. })
        ));
    }

    #[test]
    fn tool_message_without_id_is_rejected() {
        let mut conv = Conversation::new();
        let mut msg = Message::tool_result("x", "orphan");
        msg.tool_invocation_id = None;
        conv.push(msg);
        assert_eq!(
            conv.validate(),
            Err(ProtocolViolation::MissingInvocationId { index: 0 })
        );
    }
}
