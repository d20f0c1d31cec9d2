//! `retrieve_memories` tool: explicit long-term memory lookup by the model.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Result, SwitchboardError};
use crate::memory::MemoryStore;

use super::types::required_str;
use super::{Tool, ToolContext};

/// Default number of memories returned per query.
pub const DEFAULT_MAX_MEMORIES: usize = 5;

/// Searches the calling actor's memories across all of their sessions.
pub struct RetrieveMemoriesTool {
    store: Arc<dyn MemoryStore>,
    max_results: usize,
}

impl RetrieveMemoriesTool {
    pub fn new(store: Arc<dyn MemoryStore>, max_results: usize) -> Self {
        Self { store, max_results }
    }
}

#[async_trait]
impl Tool for RetrieveMemoriesTool {
    fn name(&self) -> &str {
        "retrieve_memories"
    }

    fn description(&self) -> &str {
        "Search long-term memory for facts and earlier conversation turns relevant to a query."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for in memory"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String> {
        let query = required_str(&args, "query")?;
        let actor_id = ctx
            .actor_id
            .as_deref()
            .ok_or_else(|| SwitchboardError::Tool("No actor in tool context".into()))?;

        let records = self.store.search(actor_id, query, self.max_results).await?;
        debug!(actor_id = %actor_id, found = records.len(), "retrieve_memories");

        if records.is_empty() {
            return Ok("No relevant memories found.".to_string());
        }
        Ok(records
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {}", i + 1, r.content))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
