//! Configuration management for Switchboard
//!
//! Configuration is loaded from `~/.switchboard/config.json` (or an explicit
//! path) with environment variable overrides. The loaded [`Config`] is handed
//! to constructors explicitly; there is no process-global instance.

mod types;

pub use types::*;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, SwitchboardError};

impl Config {
    /// Returns the Switchboard configuration directory path (~/.switchboard)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".switchboard")
    }

    /// Returns the path to the config file (~/.switchboard/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Resolved path of the local memory store file.
    pub fn memory_store_path(&self) -> PathBuf {
        match &self.memory.path {
            Some(path) => PathBuf::from(path),
            None => Self::dir()
                .join("memory")
                .join(format!("{}.json", self.memory.memory_id)),
        }
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables follow the pattern: SWITCHBOARD_SECTION_KEY
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SWITCHBOARD_LOGGING_LEVEL") {
            self.logging.level = val;
        }

        // Server
        if let Ok(val) = std::env::var("SWITCHBOARD_SERVER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_SERVER_PORT") {
            if let Ok(v) = val.parse() {
                self.server.port = v;
            }
        }

        // Orchestrator
        if let Ok(val) = std::env::var("SWITCHBOARD_ORCHESTRATOR_MODEL") {
            self.orchestrator.model = val;
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_ORCHESTRATOR_MAX_TOOL_ITERATIONS") {
            if let Ok(v) = val.parse() {
                self.orchestrator.max_tool_iterations = v;
            }
        }

        // Provider
        if let Ok(val) = std::env::var("SWITCHBOARD_PROVIDER_API_KEY") {
            self.provider.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_PROVIDER_API_BASE") {
            self.provider.api_base = Some(val);
        }

        // Runtime
        if let Ok(val) = std::env::var("SWITCHBOARD_RUNTIME_BASE_URL") {
            self.runtime.base_url = val;
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_RUNTIME_QUALIFIER") {
            self.runtime.qualifier = val;
        }

        // Memory
        if let Ok(val) = std::env::var("SWITCHBOARD_MEMORY_ID") {
            self.memory.memory_id = val;
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_MEMORY_PATH") {
            self.memory.path = Some(val);
        }

        self.apply_gateway_env_overrides();
    }

    /// Apply gateway overrides. Any gateway variable creates the section.
    fn apply_gateway_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SWITCHBOARD_GATEWAY_URL") {
            self.gateway.get_or_insert_with(GatewayConfig::default).url = val;
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_GATEWAY_CLIENT_ID") {
            self.gateway
                .get_or_insert_with(GatewayConfig::default)
                .client_id = val;
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_GATEWAY_CLIENT_SECRET") {
            self.gateway
                .get_or_insert_with(GatewayConfig::default)
                .client_secret = val;
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_GATEWAY_TOKEN_ENDPOINT") {
            self.gateway
                .get_or_insert_with(GatewayConfig::default)
                .token_endpoint = val;
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_GATEWAY_SCOPE") {
            self.gateway.get_or_insert_with(GatewayConfig::default).scope = val;
        }
    }

    /// Check the configuration for problems that would only surface at
    /// request time.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(SwitchboardError::Config(
                    "agent entries must have a non-empty name".into(),
                ));
            }
            if agent.endpoint_id.trim().is_empty() {
                return Err(SwitchboardError::Config(format!(
                    "agent '{}' has an empty endpoint_id",
                    agent.name
                )));
            }
            if !seen.insert(agent.name.as_str()) {
                return Err(SwitchboardError::Config(format!(
                    "agent '{}' is declared more than once",
                    agent.name
                )));
            }
        }

        if self.runtime.timeout_secs == 0 || self.provider.timeout_secs == 0 {
            return Err(SwitchboardError::Config(
                "timeouts must be greater than zero".into(),
            ));
        }

        if let Some(auth) = &self.runtime.auth {
            auth.validate()
                .map_err(|e| SwitchboardError::Config(format!("runtime.auth: {}", e)))?;
        }

        if let Some(gateway) = &self.gateway {
            let missing: Vec<&str> = [
                ("url", gateway.url.as_str()),
                ("client_id", gateway.client_id.as_str()),
                ("client_secret", gateway.client_secret.as_str()),
                ("token_endpoint", gateway.token_endpoint.as_str()),
            ]
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect();
            if !missing.is_empty() {
                return Err(SwitchboardError::Config(format!(
                    "gateway is missing: {}",
                    missing.join(", ")
                )));
            }
            if gateway.timeout_secs == 0 {
                return Err(SwitchboardError::Config(
                    "gateway.timeout_secs must be greater than zero".into(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentTarget;
    use std::io::Write;

    fn agent(name: &str, endpoint: &str) -> AgentTarget {
        AgentTarget::new(name, endpoint)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.orchestrator.default_actor_id, DEFAULT_ACTOR_ID);
        assert_eq!(config.orchestrator.default_session_id, DEFAULT_SESSION_ID);
        assert_eq!(config.memory.recent_turns, 100);
        assert_eq!(config.memory.recall_max_results, 5);
        assert_eq!(config.runtime.qualifier, "DEFAULT");
        assert!(config.agents.is_empty());
        assert!(config.gateway.is_none());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.memory.backend, MemoryBackend::Local);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "agents": [
                    {{"name": "calculator", "endpoint_id": "arn:runtime/calculator-1"}},
                    {{"name": "researcher", "endpoint_id": "arn:runtime/researcher-1",
                      "description": "Searches the web"}}
                ],
                "memory": {{"backend": "disabled"}}
            }}"#
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[1].description.as_deref(), Some("Searches the web"));
        assert_eq!(config.memory.backend, MemoryBackend::Disabled);
        assert_eq!(config.memory.recent_turns, 100);
    }

    #[test]
    fn test_memory_store_path_override() {
        let mut config = Config::default();
        assert!(config
            .memory_store_path()
            .ends_with("memory/default-memory-id.json"));
        config.memory.path = Some("/tmp/store.json".into());
        assert_eq!(config.memory_store_path(), PathBuf::from("/tmp/store.json"));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_agents() {
        let mut config = Config::default();
        config.agents = vec![agent("calculator", "a"), agent("calculator", "b")];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_validate_rejects_empty_endpoint() {
        let mut config = Config::default();
        config.agents = vec![agent("calculator", " ")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_incomplete_gateway() {
        let mut config = Config::default();
        config.gateway = Some(GatewayConfig {
            url: "https://gateway.example.com/mcp".into(),
            client_id: "id".into(),
            ..Default::default()
        });
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("client_secret"));
        assert!(err.contains("token_endpoint"));
        assert!(!err.contains("client_id"));
    }

    #[test]
    fn test_gateway_credentials_default_scope() {
        let gateway = GatewayConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            token_endpoint: "https://auth.example.com/oauth2/token".into(),
            ..Default::default()
        };
        let creds = gateway.credentials();
        assert_eq!(creds.scope.as_deref(), Some(DEFAULT_GATEWAY_SCOPE));
    }
}
