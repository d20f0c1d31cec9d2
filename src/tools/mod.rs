//! Tools module - model-callable tools and their registry
//!
//! # Overview
//!
//! - `Tool` trait: the interface every tool implements
//! - `ToolContext`: the conversation (actor, session) a call runs in
//! - `ToolRegistry`: name -> tool map producing definitions for the model
//!
//! # Built-in Tools
//!
//! - `InvokeAgentTool` (`invoke_agent`): route a prompt to a sub-agent
//! - `RetrieveMemoriesTool` (`retrieve_memories`): search the actor's memory
//! - `GatewayCallTool` (`gateway_call`): call a tool on the tool gateway

pub mod gateway;
pub mod invoke_agent;
pub mod memory;
mod registry;
mod types;

pub use gateway::GatewayCallTool;
pub use invoke_agent::InvokeAgentTool;
pub use memory::{RetrieveMemoriesTool, DEFAULT_MAX_MEMORIES};
pub use registry::ToolRegistry;
pub use types::{Tool, ToolContext};
