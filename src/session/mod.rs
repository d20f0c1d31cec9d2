//! Session module - live conversations keyed by actor and session
//!
//! The [`ConversationManager`] holds one [`Conversation`] per
//! `(actor_id, session_id)`. Each conversation sits behind its own async
//! mutex, so turns of one conversation are strictly serialised while distinct
//! conversations proceed concurrently.
//!
//! # Example
//!
//! ```
//! use switchboard::session::{ConversationKey, ConversationManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = ConversationManager::new();
//!     let key = ConversationKey::new("u1", "s1");
//!
//!     let (conversation, created) = manager.get_or_create(&key).await;
//!     assert!(created);
//!     assert_eq!(conversation.lock().await.actor_id(), "u1");
//!
//!     let (_, created) = manager.get_or_create(&key).await;
//!     assert!(!created);
//! }
//! ```

pub mod types;

pub use types::{Conversation, ConversationKey, Message, Role, ToolCall};

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Shared handle to one live conversation.
pub type ConversationHandle = Arc<Mutex<Conversation>>;

/// Registry of live conversations for the lifetime of the process.
#[derive(Default)]
pub struct ConversationManager {
    conversations: RwLock<HashMap<ConversationKey, ConversationHandle>>,
}

impl ConversationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the conversation for `key`, creating it if needed.
    ///
    /// The boolean is `true` when the conversation was created by this call,
    /// i.e. it still needs its initialisation hook.
    pub async fn get_or_create(&self, key: &ConversationKey) -> (ConversationHandle, bool) {
        if let Some(existing) = self.conversations.read().await.get(key) {
            return (Arc::clone(existing), false);
        }

        let mut conversations = self.conversations.write().await;
        // Another task may have created it between the two locks.
        if let Some(existing) = conversations.get(key) {
            return (Arc::clone(existing), false);
        }

        debug!(conversation = %key, "Creating conversation");
        let handle = Arc::new(Mutex::new(Conversation::new(
            &key.actor_id,
            &key.session_id,
        )));
        conversations.insert(key.clone(), Arc::clone(&handle));
        (handle, true)
    }

    pub async fn get(&self, key: &ConversationKey) -> Option<ConversationHandle> {
        self.conversations.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}
