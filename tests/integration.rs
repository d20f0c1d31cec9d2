//! Integration tests for Switchboard
//!
//! These tests verify that the components work together correctly:
//! configuration loading, routing over HTTP, memory persistence across
//! restarts and the HTTP entrypoint.

use std::sync::Arc;

use async_trait::async_trait;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::tempdir;

use switchboard::agents::{AgentRegistry, AgentRouter, AgentTarget, HttpAgentTransport};
use switchboard::config::{Config, MemoryBackend};
use switchboard::memory::{LocalMemoryStore, MemoryStore};
use switchboard::orchestrator::{InvokePayload, Orchestrator};
use switchboard::providers::{ChatOptions, LLMProvider, LLMResponse, ToolDefinition};
use switchboard::session::{Message, Role};
use switchboard::tools::{RetrieveMemoriesTool, Tool, ToolContext};

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "server": {"port": 9090},
            "orchestrator": {"max_tool_iterations": 4},
            "runtime": {"base_url": "http://localhost:7000", "qualifier": "PROD"},
            "agents": [
                {"name": "calculator", "endpoint_id": "arn:aws:bedrock-agentcore:eu-central-1:123:runtime/calc", "description": "Arithmetic"},
                {"name": "writer", "endpoint_id": "writer-1"}
            ],
            "memory": {"backend": "disabled"}
        }"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.orchestrator.max_tool_iterations, 4);
    assert_eq!(config.orchestrator.default_actor_id, "my-user-id");
    assert_eq!(config.runtime.qualifier, "PROD");
    assert_eq!(config.agents.len(), 2);
    assert_eq!(config.agents[0].description.as_deref(), Some("Arithmetic"));
    assert_eq!(config.memory.backend, MemoryBackend::Disabled);
    assert!(config.gateway.is_none());
}

#[test]
fn test_duplicate_agents_rejected() {
    let mut config = Config::default();
    config.agents = vec![
        AgentTarget::new("calculator", "a"),
        AgentTarget::new("calculator", "b"),
    ];
    assert!(config.validate().is_err());
}

// ============================================================================
// Routing over HTTP
// ============================================================================

async fn spawn_echo_runtime() -> String {
    let app = Router::new().route(
        "/runtimes/{endpoint_id}/invocations",
        post(|Json(body): Json<Value>| async move {
            Json(json!({"message": {"content": [{"text": format!("echo {}", body["prompt"].as_str().unwrap_or_default())}]}}))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_router_with_http_transport() {
    let base = spawn_echo_runtime().await;
    let transport = HttpAgentTransport::new(reqwest::Client::new(), &base, "DEFAULT");
    let registry = AgentRegistry::new(vec![AgentTarget::new(
        "echo",
        "arn:aws:bedrock-agentcore:eu-central-1:123:runtime/echo",
    )]);
    let router = AgentRouter::new(registry, Arc::new(transport));

    let result = router.invoke("echo", "ping").await;
    assert!(result.is_ok());
    assert_eq!(result.to_string(), "echo ping");
}

#[tokio::test]
async fn test_unreachable_runtime() {
    // Bind then drop, leaving a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport =
        HttpAgentTransport::new(reqwest::Client::new(), &format!("http://{}", addr), "DEFAULT");
    let router = AgentRouter::new(
        AgentRegistry::new(vec![AgentTarget::new("echo", "echo-1")]),
        Arc::new(transport),
    );
    let result = router.invoke("echo", "ping").await;
    assert!(result.to_string().starts_with("Error (RemoteInvocationError): "));
}

// ============================================================================
// Memory persistence
// ============================================================================

struct FixedProvider;

#[async_trait]
impl LLMProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    fn default_model(&self) -> &str {
        "fixed-model"
    }

    async fn chat(
        &self,
        messages: Vec<Message>,
        _tools: Vec<ToolDefinition>,
        _model: Option<&str>,
        _options: ChatOptions,
    ) -> switchboard::Result<LLMResponse> {
        let users = messages.iter().filter(|m| m.role == Role::User).count();
        Ok(LLMResponse::text(&format!("seen {} user turns", users)))
    }
}

#[tokio::test]
async fn test_history_survives_restart() {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.memory.path = Some(dir.path().join("memory.json").to_string_lossy().into_owned());

    {
        let orchestrator = Orchestrator::with_provider(&config, Arc::new(FixedProvider))
            .await
            .unwrap();
        let response = orchestrator
            .invoke(InvokePayload::new("first").with_session_id("s1"))
            .await;
        assert!(response.is_ok());
    }

    let orchestrator = Orchestrator::with_provider(&config, Arc::new(FixedProvider))
        .await
        .unwrap();
    let response = orchestrator
        .invoke(InvokePayload::new("second").with_session_id("s1"))
        .await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"result": "seen 2 user turns"})
    );

    // Another session of the same actor starts fresh.
    let response = orchestrator
        .invoke(InvokePayload::new("third").with_session_id("s2"))
        .await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"result": "seen 1 user turns"})
    );

    let store = LocalMemoryStore::open(dir.path().join("memory.json"))
        .await
        .unwrap();
    let turns = store.get_last_k_turns("my-user-id", "s1", 10).await.unwrap();
    let contents: Vec<_> = turns.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["first", "seen 1 user turns", "second", "seen 2 user turns"]
    );
}

#[tokio::test]
async fn test_retrieve_memories_tool_over_store() {
    let store = Arc::new(LocalMemoryStore::ephemeral());
    store
        .record_turn("u1", "s1", "The project deadline is Friday", Role::User)
        .await
        .unwrap();
    let tool = RetrieveMemoriesTool::new(store, 5);

    let ctx = ToolContext::new().with_conversation("u1", "s2");
    let out = tool
        .execute(json!({"query": "when is the deadline"}), &ctx)
        .await
        .unwrap();
    assert_eq!(out, "1. The project deadline is Friday");
}

// ============================================================================
// HTTP entrypoint
// ============================================================================

#[tokio::test]
async fn test_entrypoint_over_tcp() {
    let mut config = Config::default();
    config.memory.ephemeral = true;
    let orchestrator = Arc::new(
        Orchestrator::with_provider(&config, Arc::new(FixedProvider))
            .await
            .unwrap(),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = switchboard::server::create_app(orchestrator);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let ping: Value = client
        .get(format!("http://{}/ping", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ping, json!({"status": "Healthy"}));

    let response: Value = client
        .post(format!("http://{}/invocations", addr))
        .json(&json!({"input": "hello"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response, json!({"result": "seen 1 user turns"}));
}
