//! Conversation loop implementation
//!
//! Runs one user prompt against the model, executing requested tools until
//! the model answers in text or the iteration limit is reached.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::OrchestratorConfig;
use crate::error::Result;
use crate::hooks::{ConversationState, LifecycleHooks};
use crate::providers::{ChatOptions, LLMProvider};
use crate::session::{Conversation, Message};
use crate::tools::{ToolContext, ToolRegistry};
use crate::utils::string::preview;

/// Default upper bound on tool rounds per prompt.
pub const DEFAULT_MAX_TOOL_ITERATIONS: u32 = 10;

/// Drives a conversation through model calls and tool executions.
///
/// Hooks are a type parameter, so each loop is built for one hook
/// implementation and the calls are dispatched statically.
pub struct ConversationLoop<H: LifecycleHooks> {
    provider: Arc<dyn LLMProvider>,
    tools: ToolRegistry,
    hooks: H,
    system_prompt: Option<String>,
    model: Option<String>,
    options: ChatOptions,
    max_tool_iterations: u32,
}

impl<H: LifecycleHooks> ConversationLoop<H> {
    pub fn new(provider: Arc<dyn LLMProvider>, tools: ToolRegistry, hooks: H) -> Self {
        Self {
            provider,
            tools,
            hooks,
            system_prompt: None,
            model: None,
            options: ChatOptions::new(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }

    /// Apply the model settings of the `orchestrator` config section.
    pub fn with_config(self, config: &OrchestratorConfig) -> Self {
        self.with_system_prompt(&config.system_prompt)
            .with_model(&config.model)
            .with_options(
                ChatOptions::new()
                    .with_max_tokens(config.max_tokens)
                    .with_temperature(config.temperature),
            )
            .with_max_tool_iterations(config.max_tool_iterations)
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = (!prompt.trim().is_empty()).then(|| prompt.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = (!model.is_empty()).then(|| model.to_string());
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_tool_iterations(mut self, max: u32) -> Self {
        self.max_tool_iterations = max;
        self
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Fire the init hook for a freshly created conversation.
    pub async fn initialize(&self, conversation: &mut Conversation) {
        self.hooks.on_initialized(conversation).await;
        conversation.transition(ConversationState::Initialized);
        debug!(
            conversation = %conversation.key,
            restored = conversation.len(),
            "Conversation initialized"
        );
    }

    /// Process one user prompt and return the final assistant text.
    ///
    /// The conversation is left `Idle` whether or not the model call
    /// succeeds. Tool failures are fed back to the model as error text.
    ///
    /// # Errors
    /// Returns the provider error when a model call fails.
    pub async fn run(&self, conversation: &mut Conversation, prompt: &str) -> Result<String> {
        self.append(conversation, Message::user(prompt)).await;

        let tool_ctx =
            ToolContext::new().with_conversation(conversation.actor_id(), conversation.session_id());
        let tool_definitions = self.tools.definitions();
        let mut iteration = 0;

        loop {
            conversation.transition(ConversationState::AwaitingModel);
            self.hooks.before_model_invocation(conversation).await;

            let response = match self
                .provider
                .chat(
                    self.build_messages(conversation),
                    tool_definitions.clone(),
                    self.model.as_deref(),
                    self.options.clone(),
                )
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    conversation.transition(ConversationState::Idle);
                    return Err(e);
                }
            };

            if let Some(usage) = response.usage {
                debug!(
                    conversation = %conversation.key,
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    total_tokens = usage.total_tokens,
                    "Model usage"
                );
            }

            if !response.has_tool_calls() {
                self.append(conversation, Message::assistant(&response.content))
                    .await;
                conversation.transition(ConversationState::Idle);
                return Ok(response.content);
            }

            if iteration >= self.max_tool_iterations {
                info!(
                    conversation = %conversation.key,
                    iterations = iteration,
                    "Tool loop reached maximum iterations, returning partial response"
                );
                self.append(conversation, Message::assistant(&response.content))
                    .await;
                conversation.transition(ConversationState::Idle);
                return Ok(response.content);
            }

            iteration += 1;
            debug!(
                "Tool iteration {} of {}",
                iteration, self.max_tool_iterations
            );

            self.append(conversation, response.to_message()).await;

            for tool_call in &response.tool_calls {
                info!(tool = %tool_call.name, id = %tool_call.id, "Executing tool");

                let args: serde_json::Value = match serde_json::from_str(&tool_call.arguments) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(tool = %tool_call.name, error = %e, "Invalid JSON in tool arguments");
                        serde_json::json!({"_parse_error": format!("Invalid arguments JSON: {}", e)})
                    }
                };

                let result = match self
                    .tools
                    .execute_with_context(&tool_call.name, args, &tool_ctx)
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!(tool = %tool_call.name, error = %e, "Tool call failed");
                        format!("Error: {}", e)
                    }
                };
                debug!(tool = %tool_call.name, result = %preview(&result, 120), "Tool result");

                self.append(conversation, Message::tool_result(&tool_call.id, &result))
                    .await;
            }
        }
    }

    async fn append(&self, conversation: &mut Conversation, message: Message) {
        conversation.messages.push(message);
        conversation.transition(ConversationState::PersistingTurn);
        self.hooks.after_message_appended(conversation).await;
    }

    /// System prompt followed by the transcript.
    fn build_messages(&self, conversation: &Conversation) -> Vec<Message> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt));
        }
        messages.extend(conversation.messages.iter().cloned());
        messages
    }
}
