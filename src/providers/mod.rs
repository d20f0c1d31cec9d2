//! Providers module - chat completion backends
//!
//! Defines the [`LLMProvider`] trait the conversation loop talks to, and an
//! OpenAI-compatible implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use switchboard::providers::{ChatOptions, LLMProvider, OpenAIProvider};
//! use switchboard::session::Message;
//!
//! async fn example() {
//!     let provider = OpenAIProvider::new("your-api-key");
//!     let messages = vec![Message::user("Hello!")];
//!     let options = ChatOptions::new().with_max_tokens(1000);
//!
//!     let response = provider.chat(messages, vec![], None, options).await.unwrap();
//!     println!("Response: {}", response.content);
//! }
//! ```

pub mod openai;
mod types;

pub use openai::OpenAIProvider;
pub use types::{ChatOptions, LLMProvider, LLMResponse, LLMToolCall, ToolDefinition, Usage};
