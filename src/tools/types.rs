//! Tool types for Switchboard
//!
//! Defines the `Tool` trait every model-callable tool implements, and the
//! `ToolContext` identifying the conversation a call runs in.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Trait that all tools must implement.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use switchboard::tools::{Tool, ToolContext};
/// use switchboard::error::Result;
///
/// struct Ping;
///
/// #[async_trait]
/// impl Tool for Ping {
///     fn name(&self) -> &str { "ping" }
///     fn description(&self) -> &str { "Answers pong" }
///     fn parameters(&self) -> Value {
///         serde_json::json!({"type": "object", "properties": {}, "required": []})
///     }
///     async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<String> {
///         Ok("pong".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses to call the tool.
    fn name(&self) -> &str;

    /// Description sent to the model.
    fn description(&self) -> &str;

    /// JSON Schema of the arguments.
    fn parameters(&self) -> Value;

    /// Execute the tool. The returned text becomes the tool result turn.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String>;
}

/// The conversation a tool call belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolContext {
    pub actor_id: Option<String>,
    pub session_id: Option<String>,
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope the context to one conversation.
    ///
    /// # Example
    /// ```
    /// use switchboard::tools::ToolContext;
    ///
    /// let ctx = ToolContext::new().with_conversation("u1", "s1");
    /// assert_eq!(ctx.actor_id.as_deref(), Some("u1"));
    /// ```
    pub fn with_conversation(mut self, actor_id: &str, session_id: &str) -> Self {
        self.actor_id = Some(actor_id.to_string());
        self.session_id = Some(session_id.to_string());
        self
    }
}

/// Read a required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| crate::error::SwitchboardError::Tool(format!("Missing '{}' parameter", key)))
}
