//! CLI module: command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod agents;
pub mod common;
pub mod gateway;
pub mod serve;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(version)]
#[command(about = "Orchestrator that routes prompts to specialised remote agents", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.switchboard/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP entrypoint (/invocations, /ping)
    Serve {
        /// Bind address (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one prompt through the orchestrator and print the entrypoint JSON
    Invoke {
        #[arg(short, long)]
        prompt: String,
        #[arg(long)]
        actor_id: Option<String>,
        #[arg(long)]
        session_id: Option<String>,
    },
    /// List the registered agents
    Agents,
    /// Invoke one agent directly and print its answer
    CallAgent {
        /// Registered agent name
        name: String,
        prompt: String,
    },
    /// Call a tool on the configured tool gateway
    GatewayCall {
        /// Gateway tool name
        tool: String,
        /// JSON object passed as the tool arguments
        #[arg(long, value_name = "JSON")]
        args: Option<String>,
    },
}

/// Main CLI entry point.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let mut cmd = Cli::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let config = common::load_config(cli.config.as_deref())?;
    switchboard::utils::logging::init_logging(&config.logging)?;

    match command {
        Commands::Serve { host, port } => {
            serve::cmd_serve(config, host, port).await?;
        }
        Commands::Invoke {
            prompt,
            actor_id,
            session_id,
        } => {
            serve::cmd_invoke(config, prompt, actor_id, session_id).await?;
        }
        Commands::Agents => {
            agents::cmd_agents(&config);
        }
        Commands::CallAgent { name, prompt } => {
            agents::cmd_call_agent(&config, &name, &prompt).await?;
        }
        Commands::GatewayCall { tool, args } => {
            gateway::cmd_gateway_call(&config, &tool, args.as_deref()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_call_agent() {
        let cli = Cli::parse_from(["switchboard", "call-agent", "calculator", "15*23"]);
        match cli.command {
            Some(Commands::CallAgent { name, prompt }) => {
                assert_eq!(name, "calculator");
                assert_eq!(prompt, "15*23");
            }
            _ => panic!("expected call-agent"),
        }
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::parse_from([
            "switchboard",
            "gateway-call",
            "weather",
            "--args",
            r#"{"city":"Rome"}"#,
            "--config",
            "/tmp/switchboard.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/switchboard.json")));
        assert!(matches!(
            cli.command,
            Some(Commands::GatewayCall { ref tool, args: Some(_) }) if tool == "weather"
        ));
    }
}
