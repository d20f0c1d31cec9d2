//! Agent module - the conversation loop
//!
//! `ConversationLoop` processes one user prompt at a time:
//!
//! ```text
//! user turn ─> BeforeModelInvocation ─> LLMProvider ─┬─> final assistant turn
//!                     ▲                              │
//!                     └──── tool results <── tools <─┘
//! ```
//!
//! Every appended turn fires `AfterMessageAppended` on the loop's
//! [`LifecycleHooks`](crate::hooks::LifecycleHooks).

mod r#loop;

pub use r#loop::{ConversationLoop, DEFAULT_MAX_TOOL_ITERATIONS};
