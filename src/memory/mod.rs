//! Conversation memory: a per-(actor, session) turn log with actor-scoped
//! recall.
//!
//! [`MemoryStore`] is the narrow client contract the lifecycle hooks depend
//! on. All three operations may fail independently; callers treat failures
//! as soft (see [`crate::hooks::MemoryHookPipeline`]).

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::Role;

pub use local::LocalMemoryStore;

/// One role-tagged turn as returned by [`MemoryStore::get_last_k_turns`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

/// A persisted turn. Created once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub actor_id: String,
    pub session_id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn new(actor_id: &str, session_id: &str, role: Role, content: &str) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Memory store client contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Append one turn to the `(actor_id, session_id)` log.
    async fn record_turn(
        &self,
        actor_id: &str,
        session_id: &str,
        content: &str,
        role: Role,
    ) -> Result<()>;

    /// Up to `k` most recent turns of the session, oldest first.
    async fn get_last_k_turns(
        &self,
        actor_id: &str,
        session_id: &str,
        k: usize,
    ) -> Result<Vec<ConversationTurn>>;

    /// Free-text search over every session of `actor_id`, best match first.
    async fn search(&self, actor_id: &str, query: &str, max_results: usize)
        -> Result<Vec<MemoryRecord>>;
}
