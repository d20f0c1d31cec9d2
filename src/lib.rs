//! Switchboard - an orchestrator that routes user prompts to specialised
//! remote agents.
//!
//! A [`ConversationLoop`](agent::ConversationLoop) drives the model; the model
//! reaches sub-agents through the `invoke_agent` tool, which the
//! [`AgentRouter`](agents::AgentRouter) resolves against a static registry
//! and calls over HTTP with cached OAuth2 tokens. Answers are flattened to
//! text by the [`normalize`] module, and conversations are mirrored into a
//! [`MemoryStore`](memory::MemoryStore) by the lifecycle hooks.

pub mod agent;
pub mod agents;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod hooks;
pub mod memory;
pub mod normalize;
pub mod orchestrator;
pub mod providers;
pub mod server;
pub mod session;
pub mod tools;
pub mod utils;

pub use config::Config;
pub use error::{Result, SwitchboardError};
pub use orchestrator::{InvokePayload, InvokeResponse, Orchestrator};
pub use providers::{ChatOptions, LLMProvider, LLMResponse, LLMToolCall, ToolDefinition, Usage};
pub use session::{Conversation, Message, Role, ToolCall};
