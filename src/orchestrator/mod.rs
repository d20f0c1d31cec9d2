//! Orchestrator: the per-process context behind the exposed entrypoint.
//!
//! Owns the conversation loop, the agent router and the map of live
//! conversations. Requests for the same `(actor_id, session_id)` are
//! serialised by that conversation's lock; distinct conversations run
//! concurrently.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::agent::ConversationLoop;
use crate::agents::transport::HttpAgentTransport;
use crate::agents::{AgentRegistry, AgentRouter};
use crate::auth::TokenCache;
use crate::config::{Config, MemoryBackend};
use crate::error::Result;
use crate::gateway::GatewayClient;
use crate::hooks::{ConversationState, MemoryHookPipeline};
use crate::memory::{LocalMemoryStore, MemoryStore};
use crate::providers::openai::OpenAIProvider;
use crate::providers::LLMProvider;
use crate::session::{ConversationKey, ConversationManager};
use crate::tools::{
    GatewayCallTool, InvokeAgentTool, RetrieveMemoriesTool, ToolRegistry, DEFAULT_MAX_MEMORIES,
};
use crate::utils::string::preview;

/// Returned when the payload carries no usable prompt.
pub const MISSING_PROMPT: &str =
    "Missing prompt: send a JSON object with a non-empty \"prompt\" field";

/// Returned for every internal failure. Details only go to the log.
pub const APOLOGY: &str =
    "Sorry, something went wrong while processing your request. Please try again.";

// ============================================================================
// Entrypoint payloads
// ============================================================================

/// Request body of the entrypoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokePayload {
    #[serde(default, alias = "message", alias = "text", alias = "input")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl InvokePayload {
    pub fn new(prompt: &str) -> Self {
        Self {
            prompt: Some(prompt.to_string()),
            ..Default::default()
        }
    }

    pub fn with_actor_id(mut self, actor_id: &str) -> Self {
        self.actor_id = Some(actor_id.to_string());
        self
    }

    pub fn with_session_id(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }
}

/// Response body of the entrypoint: `{"result": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvokeResponse {
    Result { result: String },
    Error { error: String },
}

impl InvokeResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, InvokeResponse::Result { .. })
    }
}

// ============================================================================
// Construction helpers
// ============================================================================

/// Build the agent router over HTTP from the `agents` and `runtime` sections.
pub fn build_router(config: &Config, tokens: Arc<TokenCache>) -> Result<AgentRouter> {
    let transport = HttpAgentTransport::from_config(&config.runtime, tokens)?;
    Ok(AgentRouter::new(
        AgentRegistry::new(config.agents.clone()),
        Arc::new(transport),
    ))
}

/// Open the configured memory store. `None` when memory is disabled.
///
/// A store that cannot be opened disables memory for the process instead of
/// failing startup.
pub async fn open_memory_store(config: &Config) -> Option<Arc<dyn MemoryStore>> {
    match config.memory.backend {
        MemoryBackend::Disabled => None,
        MemoryBackend::Local if config.memory.ephemeral => {
            Some(Arc::new(LocalMemoryStore::ephemeral()))
        }
        MemoryBackend::Local => {
            let path = config.memory_store_path();
            match LocalMemoryStore::open(&path).await {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Memory store unavailable, continuing without memory");
                    None
                }
            }
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct Orchestrator {
    agent: ConversationLoop<MemoryHookPipeline>,
    conversations: ConversationManager,
    router: Arc<AgentRouter>,
    gateway: Option<Arc<GatewayClient>>,
    default_actor_id: String,
    default_session_id: String,
}

impl Orchestrator {
    /// Build everything from configuration, including the model provider.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let provider = OpenAIProvider::from_config(&config.provider)?;
        Self::with_provider(config, Arc::new(provider)).await
    }

    /// Build from configuration around an existing model provider.
    pub async fn with_provider(config: &Config, provider: Arc<dyn LLMProvider>) -> Result<Self> {
        let tokens = Arc::new(TokenCache::new());
        let router = Arc::new(build_router(config, Arc::clone(&tokens))?);

        let gateway = match &config.gateway {
            Some(gateway) => Some(Arc::new(GatewayClient::from_config(
                gateway,
                Arc::clone(&tokens),
            )?)),
            None => None,
        };

        let memory = open_memory_store(config).await;

        let mut tools = ToolRegistry::new();
        tools.register(Box::new(InvokeAgentTool::new(Arc::clone(&router))));
        if let Some(store) = &memory {
            tools.register(Box::new(RetrieveMemoriesTool::new(
                Arc::clone(store),
                DEFAULT_MAX_MEMORIES,
            )));
        }
        if let Some(gateway) = &gateway {
            tools.register(Box::new(GatewayCallTool::new(Arc::clone(gateway))));
        }

        let hooks = match memory {
            Some(store) => MemoryHookPipeline::new(
                store,
                config.memory.recent_turns,
                config.memory.recall_max_results,
            ),
            None => MemoryHookPipeline::disabled(),
        };

        info!(
            provider = provider.name(),
            agents = router.registry().len(),
            tools = ?tools.names(),
            memory = hooks.is_enabled(),
            "Orchestrator ready"
        );

        let agent = ConversationLoop::new(provider, tools, hooks).with_config(&config.orchestrator);

        Ok(Self {
            agent,
            conversations: ConversationManager::new(),
            router,
            gateway,
            default_actor_id: config.orchestrator.default_actor_id.clone(),
            default_session_id: config.orchestrator.default_session_id.clone(),
        })
    }

    pub fn router(&self) -> &Arc<AgentRouter> {
        &self.router
    }

    pub fn gateway(&self) -> Option<&Arc<GatewayClient>> {
        self.gateway.as_ref()
    }

    pub fn conversations(&self) -> &ConversationManager {
        &self.conversations
    }

    /// Entrypoint: resolve identifiers, run the prompt and wrap the outcome.
    ///
    /// Never fails. Internal errors are logged and answered with [`APOLOGY`].
    pub async fn invoke(&self, payload: InvokePayload) -> InvokeResponse {
        let Some(prompt) = payload.prompt.filter(|p| !p.trim().is_empty()) else {
            return InvokeResponse::Error {
                error: MISSING_PROMPT.to_string(),
            };
        };
        let actor_id = payload
            .actor_id
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| self.default_actor_id.clone());
        let session_id = payload
            .session_id
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.default_session_id.clone());

        match self.handle(&actor_id, &session_id, &prompt).await {
            Ok(result) => InvokeResponse::Result { result },
            Err(e) => {
                error!(
                    actor_id = %actor_id,
                    session_id = %session_id,
                    error = %e,
                    "Invocation failed"
                );
                InvokeResponse::Error {
                    error: APOLOGY.to_string(),
                }
            }
        }
    }

    /// Run `prompt` in the `(actor_id, session_id)` conversation.
    pub async fn handle(&self, actor_id: &str, session_id: &str, prompt: &str) -> Result<String> {
        let key = ConversationKey::new(actor_id, session_id);
        let (handle, created) = self.conversations.get_or_create(&key).await;
        if created {
            info!(conversation = %key, "New conversation");
        }

        let mut conversation = handle.lock().await;
        // A concurrent first request may have created the entry; whoever
        // takes the lock first initializes it.
        if conversation.state == ConversationState::Uninitialized {
            self.agent.initialize(&mut conversation).await;
        }

        info!(conversation = %key, prompt = %preview(prompt, 120), "Processing prompt");
        self.agent.run(&mut conversation, prompt).await
    }
}
