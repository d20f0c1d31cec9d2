//! In-process memory store with optional JSON file persistence.
//!
//! The event log is append-only. Search ranks an actor's records by the
//! number of distinct query terms they contain (terms are lowercase ASCII
//! alphanumeric runs of at least two characters); ties go to the newer
//! record and records matching no term are excluded.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, SwitchboardError};
use crate::session::Role;

use super::{ConversationTurn, MemoryRecord, MemoryStore};

/// Memory store backed by a `Vec` and, optionally, a JSON file.
pub struct LocalMemoryStore {
    records: RwLock<Vec<MemoryRecord>>,
    path: Option<PathBuf>,
}

impl LocalMemoryStore {
    /// Create a store that lives only as long as the process.
    pub fn ephemeral() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            path: None,
        }
    }

    /// Open a file-backed store, loading existing records when the file
    /// exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if tokio::fs::try_exists(&path).await? {
            let content = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&content).map_err(|e| {
                SwitchboardError::Memory(format!(
                    "failed to parse memory file {}: {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            Vec::new()
        };
        info!(path = %path.display(), records = records.len(), "Opened local memory store");
        Ok(Self {
            records: RwLock::new(records),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn persist(&self, records: &[MemoryRecord]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SwitchboardError::Memory(format!(
                    "failed to create memory directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let json = serde_json::to_string_pretty(records)?;
        tokio::fs::write(path, json).await.map_err(|e| {
            SwitchboardError::Memory(format!(
                "failed to write memory file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Lowercase terms of at least two alphanumeric characters.
fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl MemoryStore for LocalMemoryStore {
    async fn record_turn(
        &self,
        actor_id: &str,
        session_id: &str,
        content: &str,
        role: Role,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        records.push(MemoryRecord::new(actor_id, session_id, role, content));
        // On a failed write the record stays in memory; the file catches up
        // on the next successful write.
        self.persist(&records).await
    }

    async fn get_last_k_turns(
        &self,
        actor_id: &str,
        session_id: &str,
        k: usize,
    ) -> Result<Vec<ConversationTurn>> {
        let records = self.records.read().await;
        let mut turns: Vec<ConversationTurn> = records
            .iter()
            .rev()
            .filter(|r| r.actor_id == actor_id && r.session_id == session_id)
            .take(k)
            .map(|r| ConversationTurn::new(r.role, &r.content))
            .collect();
        turns.reverse();
        Ok(turns)
    }

    async fn search(
        &self,
        actor_id: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<MemoryRecord>> {
        let terms = tokenize(query);
        if terms.is_empty() || max_results == 0 {
            return Ok(Vec::new());
        }

        let records = self.records.read().await;
        // Scored newest first so the stable sort keeps newer records ahead on ties.
        let mut scored: Vec<(usize, &MemoryRecord)> = records
            .iter()
            .rev()
            .filter(|r| r.actor_id == actor_id)
            .filter_map(|r| {
                let words = tokenize(&r.content);
                let score = terms.iter().filter(|t| words.contains(*t)).count();
                (score > 0).then_some((score, r))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        debug!(actor_id = %actor_id, matches = scored.len(), "Memory search");
        Ok(scored
            .into_iter()
            .take(max_results)
            .map(|(_, r)| r.clone())
            .collect())
    }
}
