//! Conversation types for Switchboard
//!
//! Messages, roles and tool calls exchanged with the model, plus the
//! [`Conversation`] transcript owned by one `(actor_id, session_id)` pair.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hooks::ConversationState;

/// Identifies one conversation: the actor it belongs to and the
/// caller-supplied session id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub actor_id: String,
    pub session_id: String,
}

impl ConversationKey {
    pub fn new(actor_id: &str, session_id: &str) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            session_id: session_id.to_string(),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.actor_id, self.session_id)
    }
}

/// The in-memory transcript of one conversation.
///
/// The transcript is authoritative for the life of the process; the memory
/// store only mirrors it.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub key: ConversationKey,
    /// Ordered transcript, insertion order is externally observable.
    pub messages: Vec<Message>,
    pub state: ConversationState,
}

impl Conversation {
    /// Create an empty, uninitialised conversation.
    ///
    /// # Example
    /// ```
    /// use switchboard::session::Conversation;
    /// use switchboard::hooks::ConversationState;
    ///
    /// let conversation = Conversation::new("u1", "s1");
    /// assert!(conversation.messages.is_empty());
    /// assert_eq!(conversation.state, ConversationState::Uninitialized);
    /// ```
    pub fn new(actor_id: &str, session_id: &str) -> Self {
        Self {
            key: ConversationKey::new(actor_id, session_id),
            messages: Vec::new(),
            state: ConversationState::Uninitialized,
        }
    }

    pub fn actor_id(&self) -> &str {
        &self.key.actor_id
    }

    pub fn session_id(&self) -> &str {
        &self.key.session_id
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Index of the most recent user message, if any.
    pub fn last_user_index(&self) -> Option<usize> {
        self.messages.iter().rposition(|m| m.role == Role::User)
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool calls requested by the assistant (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// ID of the tool call this message answers (tool results only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn with_role(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a new user message.
    ///
    /// # Example
    /// ```
    /// use switchboard::session::{Message, Role};
    ///
    /// let msg = Message::user("15*23");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: &str) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: &str) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    pub fn system(content: &str) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a tool result message answering `tool_call_id`.
    pub fn tool_result(tool_call_id: &str, content: &str) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.to_string()),
            ..Self::with_role(Role::Tool, content)
        }
    }

    /// Create an assistant message carrying tool calls.
    pub fn assistant_with_tools(content: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(tool_calls),
            ..Self::with_role(Role::Assistant, content)
        }
    }

    /// Build a message from a stored `(role, content)` turn.
    pub fn from_turn(role: Role, content: &str) -> Self {
        Self::with_role(role, content)
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .map(|tc| !tc.is_empty())
            .unwrap_or(false)
    }

    /// Text persisted to the memory store for this message.
    ///
    /// An assistant message that only requests tools has no text, so its
    /// tool calls are recorded as JSON instead.
    pub fn persisted_content(&self) -> String {
        if self.content.is_empty() {
            if let Some(calls) = self.tool_calls.as_ref().filter(|c| !c.is_empty()) {
                return serde_json::to_string(calls).unwrap_or_default();
            }
        }
        self.content.clone()
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Results from tool executions
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool call requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: &str, name: &str, arguments: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    /// Parse the arguments as a specific type.
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.arguments)
    }
}
