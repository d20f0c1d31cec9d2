//! Routing of agent invocations.
//!
//! [`AgentRouter::invoke`] resolves a logical agent name, performs exactly one
//! remote call through an [`AgentTransport`], and normalizes the answer. It
//! never retries; retry policy belongs to the caller, which is usually the
//! model itself.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, SwitchboardError};
use crate::normalize::RawResponse;
use crate::utils::string::preview;

use super::{AgentRegistry, AgentTarget};

/// Characters of prompt/result kept in log lines.
const LOG_PREVIEW_CHARS: usize = 120;

/// One outbound invocation. Call-scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub agent_name: String,
    pub prompt: String,
    /// Fresh per call, never inherited from the parent conversation.
    pub session_id: Uuid,
}

impl InvocationRequest {
    pub fn new(agent_name: &str, prompt: &str) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            prompt: prompt.to_string(),
            session_id: Uuid::new_v4(),
        }
    }
}

/// Why an invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationErrorKind {
    UnknownAgent,
    RemoteInvocationError,
}

impl fmt::Display for InvocationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationErrorKind::UnknownAgent => f.write_str("UnknownAgent"),
            InvocationErrorKind::RemoteInvocationError => f.write_str("RemoteInvocationError"),
        }
    }
}

/// Outcome of [`AgentRouter::invoke`].
///
/// The `Display` form is what the model sees as tool output, so errors are
/// text too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    Ok {
        text: String,
    },
    Err {
        kind: InvocationErrorKind,
        message: String,
    },
}

impl InvocationResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, InvocationResult::Ok { .. })
    }

    pub fn kind(&self) -> Option<InvocationErrorKind> {
        match self {
            InvocationResult::Ok { .. } => None,
            InvocationResult::Err { kind, .. } => Some(*kind),
        }
    }

    fn from_error(err: SwitchboardError) -> Self {
        match err {
            SwitchboardError::UnknownAgent { .. } => InvocationResult::Err {
                kind: InvocationErrorKind::UnknownAgent,
                message: err.to_string(),
            },
            other => InvocationResult::Err {
                kind: InvocationErrorKind::RemoteInvocationError,
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for InvocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationResult::Ok { text } => f.write_str(text),
            InvocationResult::Err { kind, message } => write!(f, "Error ({}): {}", kind, message),
        }
    }
}

/// Performs the remote call for one invocation.
///
/// Implementations return the undecoded response; normalization happens in
/// the router. Any `Err` becomes a `RemoteInvocationError` result.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn invoke(&self, target: &AgentTarget, request: &InvocationRequest)
        -> Result<RawResponse>;
}

/// Resolves agent names and invokes them.
pub struct AgentRouter {
    registry: AgentRegistry,
    transport: Arc<dyn AgentTransport>,
}

impl AgentRouter {
    pub fn new(registry: AgentRegistry, transport: Arc<dyn AgentTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Invoke `agent_name` with `prompt`.
    ///
    /// An unknown name returns `Err{UnknownAgent}` listing every registered
    /// agent and makes no network call.
    pub async fn invoke(&self, agent_name: &str, prompt: &str) -> InvocationResult {
        let Some(target) = self.registry.get(agent_name) else {
            let err = SwitchboardError::UnknownAgent {
                name: agent_name.to_string(),
                available: self.registry.names(),
            };
            warn!(agent = %agent_name, "Unknown agent requested");
            return InvocationResult::from_error(err);
        };

        let request = InvocationRequest::new(agent_name, prompt);
        info!(
            agent = %agent_name,
            session_id = %request.session_id,
            prompt = %preview(prompt, LOG_PREVIEW_CHARS),
            "Invoking agent"
        );

        let start = Instant::now();
        match self.transport.invoke(target, &request).await {
            Ok(raw) => {
                let text = raw.into_text();
                info!(
                    agent = %agent_name,
                    latency_ms = start.elapsed().as_millis() as u64,
                    result = %preview(&text, LOG_PREVIEW_CHARS),
                    "Agent invocation completed"
                );
                InvocationResult::Ok { text }
            }
            Err(e) => {
                warn!(
                    agent = %agent_name,
                    latency_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Agent invocation failed"
                );
                InvocationResult::from_error(e)
            }
        }
    }
}
