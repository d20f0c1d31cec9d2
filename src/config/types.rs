//! Configuration types for Switchboard
//!
//! Every section deserializes with `#[serde(default)]` so a partial
//! `config.json` only needs the keys it wants to change.

use serde::{Deserialize, Serialize};

use crate::agents::AgentTarget;
use crate::auth::ClientCredentials;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log output settings.
    pub logging: LoggingConfig,
    /// HTTP entrypoint bind address.
    pub server: ServerConfig,
    /// Conversation loop and entrypoint defaults.
    pub orchestrator: OrchestratorConfig,
    /// Model provider credentials.
    pub provider: ProviderConfig,
    /// Remote agent runtime settings.
    pub runtime: RuntimeConfig,
    /// Static agent registry, loaded once at startup.
    pub agents: Vec<AgentTarget>,
    /// Conversation memory settings.
    pub memory: MemoryConfig,
    /// Optional OAuth-protected tool gateway.
    pub gateway: Option<GatewayConfig>,
}

// ============================================================================
// Logging
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable output.
    Pretty,
    /// Compact single-line output (default).
    #[default]
    Component,
    /// JSON lines.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Optional log file (JSON format only).
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Component,
            level: "info".to_string(),
            file: None,
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// Bind address for the `/invocations` entrypoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Default actor id applied when a payload carries none.
pub const DEFAULT_ACTOR_ID: &str = "my-user-id";
/// Default session id applied when a payload carries none.
pub const DEFAULT_SESSION_ID: &str = "DEFAULT";

/// Orchestrator conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Sentinel actor id for payloads without `actor_id`.
    pub default_actor_id: String,
    /// Sentinel session id for payloads without `session_id`.
    pub default_session_id: String,
    /// System prompt placed ahead of every model call.
    pub system_prompt: String,
    /// Model identifier passed to the provider.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound on model → tool → model rounds per user prompt.
    pub max_tool_iterations: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_actor_id: DEFAULT_ACTOR_ID.to_string(),
            default_session_id: DEFAULT_SESSION_ID.to_string(),
            system_prompt: "You are the orchestrator, a personal assistant that coordinates \
                            specialised agents. Analyse each request, delegate subtasks with \
                            the invoke_agent tool when a specialised agent fits, and answer \
                            clearly and concisely."
                .to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 4096,
            temperature: 0.3,
            max_tool_iterations: 10,
        }
    }
}

// ============================================================================
// Provider
// ============================================================================

/// OpenAI-compatible provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    /// Base URL (defaults to the public OpenAI API).
    pub api_base: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            timeout_secs: 60,
        }
    }
}

// ============================================================================
// Runtime
// ============================================================================

/// Remote agent runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Base URL of the runtime data plane.
    pub base_url: String,
    /// Endpoint qualifier appended to every invocation.
    pub qualifier: String,
    pub timeout_secs: u64,
    /// Client credentials for bearer-authenticated runtimes.
    pub auth: Option<ClientCredentials>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bedrock-agentcore.us-east-1.amazonaws.com".to_string(),
            qualifier: "DEFAULT".to_string(),
            timeout_secs: 30,
            auth: None,
        }
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Memory backend selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    /// Lifecycle hooks become no-ops.
    Disabled,
    /// In-process event log, optionally persisted to a JSON file.
    #[default]
    Local,
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub backend: MemoryBackend,
    /// Identifier of the memory instance; names the default store file.
    pub memory_id: String,
    /// Store file override. `None` uses `~/.switchboard/memory/<memory_id>.json`.
    pub path: Option<String>,
    /// Keep the local store purely in memory.
    pub ephemeral: bool,
    /// Turns loaded when a conversation is initialised.
    pub recent_turns: usize,
    /// Recollections injected before each model call.
    pub recall_max_results: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: MemoryBackend::Local,
            memory_id: "default-memory-id".to_string(),
            path: None,
            ephemeral: false,
            recent_turns: 100,
            recall_max_results: 5,
        }
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Default OAuth scope requested for gateway tokens.
pub const DEFAULT_GATEWAY_SCOPE: &str = "invoke";

/// OAuth-protected tool gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// JSON-RPC endpoint of the gateway.
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
    pub token_endpoint: String,
    pub scope: String,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            token_endpoint: String::new(),
            scope: DEFAULT_GATEWAY_SCOPE.to_string(),
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Client credentials for the gateway's token endpoint.
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            token_endpoint: self.token_endpoint.clone(),
            scope: Some(self.scope.clone()).filter(|s| !s.is_empty()),
        }
    }
}
