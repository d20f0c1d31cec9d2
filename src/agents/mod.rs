//! Agents module - registry, routing and transport for remote agents
//!
//! # Overview
//!
//! - [`AgentRegistry`]: static name → [`AgentTarget`] table
//! - [`AgentRouter`]: resolves a name, calls the transport once, normalizes
//! - [`AgentTransport`]: the remote call seam; [`HttpAgentTransport`] is the
//!   production implementation
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use switchboard::agents::{AgentRegistry, AgentRouter, AgentTarget, HttpAgentTransport};
//! use switchboard::auth::TokenCache;
//! use switchboard::config::RuntimeConfig;
//!
//! async fn example() {
//!     let registry = AgentRegistry::new(vec![AgentTarget::new("calculator", "arn:...")]);
//!     let transport =
//!         HttpAgentTransport::from_config(&RuntimeConfig::default(), Arc::new(TokenCache::new()))
//!             .unwrap();
//!     let router = AgentRouter::new(registry, Arc::new(transport));
//!     println!("{}", router.invoke("calculator", "15*23").await);
//! }
//! ```

mod registry;
mod router;
pub mod transport;

pub use registry::{AgentRegistry, AgentTarget};
pub use router::{
    AgentRouter, AgentTransport, InvocationErrorKind, InvocationRequest, InvocationResult,
};
pub use transport::HttpAgentTransport;
