//! Error types for Switchboard
//!
//! This module defines all error types used throughout the invocation and
//! memory pipeline. Uses `thiserror` for ergonomic error handling with
//! automatic `Display` and `Error` trait implementations.
//!
//! Decoding a remote agent response never fails, so there is deliberately no
//! "malformed response" variant: upstream garbage degrades to raw text in
//! [`crate::normalize`].

use thiserror::Error;

/// The primary error type for Switchboard operations.
#[derive(Error, Debug)]
pub enum SwitchboardError {
    /// Configuration-related errors (invalid config, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// OAuth2 token retrieval failed (endpoint unreachable, non-2xx, bad body).
    /// Fatal to the call that needed the token, never to the process.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Routing miss: the requested agent is not in the registry.
    #[error("{name} not available; available: {}", available.join(", "))]
    UnknownAgent {
        /// The name that was requested.
        name: String,
        /// Every registered agent name, in registry order.
        available: Vec<String>,
    },

    /// Transport or remote-side failure while invoking a sub-agent.
    #[error("Remote invocation error: {0}")]
    RemoteInvocation(String),

    /// Memory store unreachable or rejected the request. Always soft.
    #[error("Memory unavailable: {0}")]
    Memory(String),

    /// Model provider errors (API failures, malformed completions, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Tool execution errors (invalid parameters, gateway tool failures, etc.)
    #[error("Tool error: {0}")]
    Tool(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A specialized `Result` type for Switchboard operations.
pub type Result<T> = std::result::Result<T, SwitchboardError>;
