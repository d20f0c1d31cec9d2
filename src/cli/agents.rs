//! Agent registry commands: `agents` and `call-agent`.

use std::sync::Arc;

use anyhow::Result;

use switchboard::agents::AgentRegistry;
use switchboard::auth::TokenCache;
use switchboard::config::Config;
use switchboard::orchestrator::build_router;

/// List the configured agents.
pub(crate) fn cmd_agents(config: &Config) {
    let registry = AgentRegistry::new(config.agents.clone());
    if registry.is_empty() {
        println!("No agents configured.");
        return;
    }

    println!("Registered agents ({}):", registry.len());
    for target in registry.iter() {
        match &target.description {
            Some(description) => println!(
                "  {:<20} {}  {}",
                target.name, target.endpoint_id, description
            ),
            None => println!("  {:<20} {}", target.name, target.endpoint_id),
        }
    }
}

/// Invoke one agent through the router and print its normalized answer.
pub(crate) async fn cmd_call_agent(config: &Config, name: &str, prompt: &str) -> Result<()> {
    let router = build_router(config, Arc::new(TokenCache::new()))?;
    let result = router.invoke(name, prompt).await;
    println!("{}", result);
    if !result.is_ok() {
        anyhow::bail!("Invocation of '{}' failed", name);
    }
    Ok(())
}
