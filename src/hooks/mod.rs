//! Conversation lifecycle hooks.
//!
//! A conversation moves through an explicit state machine:
//!
//! ```text
//! Uninitialized -> Initialized -> { Idle <-> AwaitingModel <-> PersistingTurn }
//! ```
//!
//! and the conversation loop calls three transition hooks, always in this
//! order and never concurrently for one conversation:
//!
//! - `on_initialized` - once, when the conversation is created
//! - `before_model_invocation` - before every model call
//! - `after_message_appended` - after every message added to the transcript
//!
//! [`MemoryHookPipeline`] implements them against a [`MemoryStore`]: it
//! restores prior turns, injects long-term recall next to the triggering user
//! message, and mirrors each new message into the store. Every store failure
//! is logged and swallowed.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use switchboard::hooks::{LifecycleHooks, MemoryHookPipeline};
//! use switchboard::memory::{LocalMemoryStore, MemoryStore};
//! use switchboard::session::{Conversation, Message, Role};
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(LocalMemoryStore::ephemeral());
//! store.record_turn("u1", "old", "My favourite colour is green", Role::User).await.unwrap();
//!
//! let hooks = MemoryHookPipeline::new(store, 100, 5);
//! let mut conversation = Conversation::new("u1", "s1");
//! hooks.on_initialized(&mut conversation).await;
//!
//! conversation.messages.push(Message::user("Which colour do I like?"));
//! hooks.before_model_invocation(&mut conversation).await;
//! assert_eq!(conversation.messages[0].role, Role::System);
//! assert!(conversation.messages[0].content.contains("green"));
//! # });
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::memory::{MemoryRecord, MemoryStore};
use crate::session::{Conversation, Message, Role};

/// First line of an injected recall turn.
pub const RECALL_HEADER: &str = "Relevant information from long-term memory:";

// ---------------------------------------------------------------------------
// Conversation state
// ---------------------------------------------------------------------------

/// Lifecycle state of one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationState {
    /// Created, history not loaded yet.
    Uninitialized,
    /// History loaded, no turn processed yet.
    Initialized,
    /// Waiting for the next user prompt.
    Idle,
    /// A model call is about to run or is running.
    AwaitingModel,
    /// A freshly appended message is being mirrored to the store.
    PersistingTurn,
}

impl ConversationState {
    /// Whether the loop may move from `self` to `next`.
    pub fn can_transition_to(self, next: ConversationState) -> bool {
        use ConversationState::*;
        matches!(
            (self, next),
            (Uninitialized, Initialized)
                | (Initialized, PersistingTurn)
                | (Initialized, AwaitingModel)
                | (Idle, PersistingTurn)
                | (Idle, AwaitingModel)
                | (AwaitingModel, PersistingTurn)
                | (AwaitingModel, Idle)
                | (PersistingTurn, AwaitingModel)
                | (PersistingTurn, Idle)
        )
    }
}

impl Conversation {
    /// Move to `next`, logging transitions the state machine does not allow.
    pub fn transition(&mut self, next: ConversationState) {
        if self.state != next && !self.state.can_transition_to(next) {
            warn!(
                conversation = %self.key,
                from = ?self.state,
                to = ?next,
                "Unexpected conversation state transition"
            );
        }
        self.state = next;
    }
}

// ---------------------------------------------------------------------------
// Hook trait
// ---------------------------------------------------------------------------

/// Transition hooks called by the conversation loop.
///
/// Every method defaults to a no-op. Hooks never fail: anything that goes
/// wrong inside a hook is the hook's to log.
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    /// Fires once, right after the conversation is created.
    async fn on_initialized(&self, _conversation: &mut Conversation) {}

    /// Fires before every model call.
    async fn before_model_invocation(&self, _conversation: &mut Conversation) {}

    /// Fires after each message appended to the transcript.
    async fn after_message_appended(&self, _conversation: &Conversation) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl LifecycleHooks for NoopHooks {}

// ---------------------------------------------------------------------------
// Memory hook pipeline
// ---------------------------------------------------------------------------

/// Memory-backed lifecycle hooks.
pub struct MemoryHookPipeline {
    store: Option<Arc<dyn MemoryStore>>,
    recent_turns: usize,
    recall_max_results: usize,
}

impl MemoryHookPipeline {
    /// Create a pipeline over `store`.
    ///
    /// `recent_turns` bounds the history restored on initialisation,
    /// `recall_max_results` the recollections injected per model call.
    pub fn new(store: Arc<dyn MemoryStore>, recent_turns: usize, recall_max_results: usize) -> Self {
        Self {
            store: Some(store),
            recent_turns,
            recall_max_results,
        }
    }

    /// A pipeline with no store; every hook is a no-op.
    pub fn disabled() -> Self {
        Self {
            store: None,
            recent_turns: 0,
            recall_max_results: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }
}

/// Render recollections as one system turn.
fn recall_message(records: &[MemoryRecord]) -> Message {
    let mut content = String::from(RECALL_HEADER);
    for (i, record) in records.iter().enumerate() {
        content.push_str(&format!("\n{}. {}", i + 1, record.content));
    }
    Message::system(&content)
}

fn is_recall_message(message: &Message) -> bool {
    message.role == Role::System && message.content.starts_with(RECALL_HEADER)
}

#[async_trait]
impl LifecycleHooks for MemoryHookPipeline {
    async fn on_initialized(&self, conversation: &mut Conversation) {
        let Some(store) = &self.store else {
            return;
        };

        match store
            .get_last_k_turns(
                conversation.actor_id(),
                conversation.session_id(),
                self.recent_turns,
            )
            .await
        {
            Ok(turns) => {
                debug!(
                    conversation = %conversation.key,
                    turns = turns.len(),
                    "Restored conversation history"
                );
                let mut messages: Vec<Message> = turns
                    .iter()
                    .map(|t| Message::from_turn(t.role, &t.content))
                    .collect();
                messages.append(&mut conversation.messages);
                conversation.messages = messages;
            }
            Err(e) => {
                warn!(
                    conversation = %conversation.key,
                    error = %e,
                    "Failed to load conversation history, starting empty"
                );
            }
        }
    }

    async fn before_model_invocation(&self, conversation: &mut Conversation) {
        let Some(store) = &self.store else {
            return;
        };
        let Some(user_index) = conversation.last_user_index() else {
            return;
        };
        let query = conversation.messages[user_index].content.clone();
        if query.trim().is_empty() {
            return;
        }

        let records = match store
            .search(conversation.actor_id(), &query, self.recall_max_results)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    conversation = %conversation.key,
                    error = %e,
                    "Long-term recall failed, continuing without it"
                );
                return;
            }
        };

        // The triggering turn was persisted a moment ago; it is not a recollection.
        let records: Vec<MemoryRecord> = records
            .into_iter()
            .filter(|r| !(r.session_id == conversation.session_id() && r.content == query))
            .collect();
        if records.is_empty() {
            debug!(conversation = %conversation.key, "No long-term recollections");
            return;
        }

        debug!(
            conversation = %conversation.key,
            recollections = records.len(),
            "Injecting long-term recall"
        );
        let message = recall_message(&records);
        if user_index > 0 && is_recall_message(&conversation.messages[user_index - 1]) {
            conversation.messages[user_index - 1] = message;
        } else {
            conversation.messages.insert(user_index, message);
        }
    }

    async fn after_message_appended(&self, conversation: &Conversation) {
        let Some(store) = &self.store else {
            return;
        };
        let Some(message) = conversation.last_message() else {
            return;
        };

        if let Err(e) = store
            .record_turn(
                conversation.actor_id(),
                conversation.session_id(),
                &message.persisted_content(),
                message.role,
            )
            .await
        {
            warn!(
                conversation = %conversation.key,
                role = %message.role,
                error = %e,
                "Failed to persist turn"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwitchboardError;
    use crate::memory::{ConversationTurn, MockMemoryStore};
    use mockall::predicate::eq;

    fn record(session_id: &str, content: &str) -> MemoryRecord {
        MemoryRecord::new("u1", session_id, Role::User, content)
    }

    #[tokio::test]
    async fn test_init_prepends_history_in_stored_order() {
        let mut store = MockMemoryStore::new();
        store
            .expect_get_last_k_turns()
            .with(eq("u1"), eq("s1"), eq(100usize))
            .times(1)
            .returning(|_, _, _| {
                Ok(vec![
                    ConversationTurn::new(Role::User, "15*23"),
                    ConversationTurn::new(Role::Assistant, "345"),
                ])
            });
        let hooks = MemoryHookPipeline::new(Arc::new(store), 100, 5);

        let mut conversation = Conversation::new("u1", "s1");
        conversation.messages.push(Message::user("and 2+2?"));
        hooks.on_initialized(&mut conversation).await;

        let contents: Vec<_> = conversation.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["15*23", "345", "and 2+2?"]);
        assert_eq!(conversation.messages[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_init_failure_is_soft() {
        let mut store = MockMemoryStore::new();
        store
            .expect_get_last_k_turns()
            .returning(|_, _, _| Err(SwitchboardError::Memory("unreachable".into())));
        let hooks = MemoryHookPipeline::new(Arc::new(store), 100, 5);

        let mut conversation = Conversation::new("u1", "s1");
        hooks.on_initialized(&mut conversation).await;
        assert_eq!(conversation.len(), 0);
    }

    #[tokio::test]
    async fn test_recall_inserted_before_last_user_turn() {
        let mut store = MockMemoryStore::new();
        store
            .expect_search()
            .with(eq("u1"), eq("A"), eq(5usize))
            .times(1)
            .returning(|_, _, _| Ok(vec![record("old", "fact1")]));
        let hooks = MemoryHookPipeline::new(Arc::new(store), 100, 5);

        let mut conversation = Conversation::new("u1", "s1");
        conversation.messages.push(Message::user("A"));
        hooks.before_model_invocation(&mut conversation).await;

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages[0].role, Role::System);
        assert!(conversation.messages[0].content.contains("fact1"));
        assert_eq!(conversation.messages[1], Message::user("A"));
    }

    #[tokio::test]
    async fn test_recall_numbered_list() {
        let mut store = MockMemoryStore::new();
        store
            .expect_search()
            .returning(|_, _, _| Ok(vec![record("a", "first"), record("b", "second")]));
        let hooks = MemoryHookPipeline::new(Arc::new(store), 100, 5);

        let mut conversation = Conversation::new("u1", "s1");
        conversation.messages.push(Message::user("earlier"));
        conversation.messages.push(Message::assistant("reply"));
        conversation.messages.push(Message::user("now"));
        conversation.messages.push(Message::tool_result("call_1", "tool output"));
        hooks.before_model_invocation(&mut conversation).await;

        assert_eq!(
            conversation.messages[2].content,
            format!("{}\n1. first\n2. second", RECALL_HEADER)
        );
        assert_eq!(conversation.messages[3].content, "now");
        assert_eq!(conversation.len(), 5);
    }

    #[tokio::test]
    async fn test_recall_not_duplicated_across_tool_rounds() {
        let mut store = MockMemoryStore::new();
        store
            .expect_search()
            .times(2)
            .returning(|_, _, _| Ok(vec![record("old", "fact1")]));
        let hooks = MemoryHookPipeline::new(Arc::new(store), 100, 5);

        let mut conversation = Conversation::new("u1", "s1");
        conversation.messages.push(Message::user("A"));
        hooks.before_model_invocation(&mut conversation).await;
        hooks.before_model_invocation(&mut conversation).await;

        assert_eq!(conversation.len(), 2);
    }

    #[tokio::test]
    async fn test_recall_skips_without_user_turn_or_results() {
        let mut store = MockMemoryStore::new();
        store.expect_search().returning(|_, _, _| Ok(vec![]));
        let hooks = MemoryHookPipeline::new(Arc::new(store), 100, 5);

        let mut conversation = Conversation::new("u1", "s1");
        hooks.before_model_invocation(&mut conversation).await;
        assert!(conversation.is_empty());

        conversation.messages.push(Message::user("A"));
        hooks.before_model_invocation(&mut conversation).await;
        assert_eq!(conversation.len(), 1);
    }

    #[tokio::test]
    async fn test_recall_ignores_echo_of_triggering_turn() {
        let mut store = MockMemoryStore::new();
        store
            .expect_search()
            .returning(|_, _, _| Ok(vec![record("s1", "A")]));
        let hooks = MemoryHookPipeline::new(Arc::new(store), 100, 5);

        let mut conversation = Conversation::new("u1", "s1");
        conversation.messages.push(Message::user("A"));
        hooks.before_model_invocation(&mut conversation).await;
        assert_eq!(conversation.len(), 1);
    }

    #[tokio::test]
    async fn test_recall_failure_is_soft() {
        let mut store = MockMemoryStore::new();
        store
            .expect_search()
            .returning(|_, _, _| Err(SwitchboardError::Memory("timeout".into())));
        let hooks = MemoryHookPipeline::new(Arc::new(store), 100, 5);

        let mut conversation = Conversation::new("u1", "s1");
        conversation.messages.push(Message::user("A"));
        hooks.before_model_invocation(&mut conversation).await;
        assert_eq!(conversation.messages, vec![Message::user("A")]);
    }

    #[tokio::test]
    async fn test_after_append_persists_last_message() {
        let mut store = MockMemoryStore::new();
        store
            .expect_record_turn()
            .with(eq("u1"), eq("s1"), eq("345"), eq(Role::Assistant))
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        let hooks = MemoryHookPipeline::new(Arc::new(store), 100, 5);

        let mut conversation = Conversation::new("u1", "s1");
        conversation.messages.push(Message::user("15*23"));
        conversation.messages.push(Message::assistant("345"));
        hooks.after_message_appended(&conversation).await;
    }

    #[tokio::test]
    async fn test_after_append_failure_is_soft() {
        let mut store = MockMemoryStore::new();
        store
            .expect_record_turn()
            .returning(|_, _, _, _| Err(SwitchboardError::Memory("down".into())));
        let hooks = MemoryHookPipeline::new(Arc::new(store), 100, 5);

        let mut conversation = Conversation::new("u1", "s1");
        conversation.messages.push(Message::user("hello"));
        hooks.after_message_appended(&conversation).await;
        assert_eq!(conversation.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_pipeline_is_noop() {
        let hooks = MemoryHookPipeline::disabled();
        assert!(!hooks.is_enabled());

        let mut conversation = Conversation::new("u1", "s1");
        conversation.messages.push(Message::user("A"));
        hooks.on_initialized(&mut conversation).await;
        hooks.before_model_invocation(&mut conversation).await;
        hooks.after_message_appended(&conversation).await;
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_state_transitions() {
        use ConversationState::*;
        assert!(Uninitialized.can_transition_to(Initialized));
        assert!(Idle.can_transition_to(PersistingTurn));
        assert!(PersistingTurn.can_transition_to(AwaitingModel));
        assert!(AwaitingModel.can_transition_to(PersistingTurn));
        assert!(PersistingTurn.can_transition_to(Idle));
        assert!(!Uninitialized.can_transition_to(AwaitingModel));
        assert!(!Idle.can_transition_to(Uninitialized));
        assert!(!Initialized.can_transition_to(Uninitialized));
    }
}
