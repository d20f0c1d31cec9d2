//! Entrypoint commands: `serve` and `invoke`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use switchboard::config::Config;
use switchboard::orchestrator::{InvokePayload, Orchestrator};
use switchboard::server;

/// Serve the HTTP entrypoint until Ctrl-C.
pub(crate) async fn cmd_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let orchestrator = Orchestrator::from_config(&config)
        .await
        .with_context(|| "Failed to start orchestrator")?;
    info!(agents = config.agents.len(), "Starting switchboard");
    server::serve(Arc::new(orchestrator), &config.server.host, config.server.port).await?;
    Ok(())
}

/// Run one prompt and print the entrypoint response as JSON.
pub(crate) async fn cmd_invoke(
    config: Config,
    prompt: String,
    actor_id: Option<String>,
    session_id: Option<String>,
) -> Result<()> {
    let orchestrator = Orchestrator::from_config(&config)
        .await
        .with_context(|| "Failed to start orchestrator")?;

    let payload = InvokePayload {
        prompt: Some(prompt),
        actor_id,
        session_id,
    };
    let response = orchestrator.invoke(payload).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
