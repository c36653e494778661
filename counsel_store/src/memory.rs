//! Volatile, process-local storage strategies.
//!
//! Useful for single-node deployments that accept losing context on restart,
//! and as the backing for tests. Maps are guarded by `tokio::sync::RwLock`,
//! so insert-if-absent and append are atomic per session id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use counsel_core::{ChatMessage, HistoryProvider, MessageStore, Role, StorageError, Turn};
use tokio::sync::RwLock;

/// In-memory history provider, lost on restart.
#[derive(Default)]
pub struct MemoryHistory {
    sessions: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl MemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl HistoryProvider for MemoryHistory {
    async fn get_context(&self, session_id: &str) -> Result<Vec<ChatMessage>, StorageError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.entry(session_id.to_owned()).or_default().clone())
    }

    async fn append(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), StorageError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_owned())
            .or_default()
            .push(ChatMessage::new(role, content));
        Ok(())
    }
}

/// In-memory audit log with a process-wide auto-increment id.
#[derive(Default)]
pub struct MemoryMessageStore {
    turns: RwLock<HashMap<String, Vec<Turn>>>,
    next_id: AtomicI64,
}

impl MemoryMessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn append(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Turn, StorageError> {
        let turn = Turn {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            role,
            content: content.to_owned(),
            created_at: Utc::now(),
        };

        let mut turns = self.turns.write().await;
        turns
            .entry(session_id.to_owned())
            .or_default()
            .push(turn.clone());

        Ok(turn)
    }

    async fn list(&self, session_id: &str) -> Result<Vec<Turn>, StorageError> {
        let turns = self.turns.read().await;
        Ok(turns.get(session_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_context_registers_exactly_one_session() {
        let history = MemoryHistory::new();

        let first = history.get_context("s1").await.unwrap();
        let second = history.get_context("s1").await.unwrap();

        assert!(first.is_empty());
        assert!(second.is_empty());
        assert_eq!(history.session_count().await, 1);
    }

    #[tokio::test]
    async fn history_appends_preserve_order_and_content() {
        let history = MemoryHistory::new();

        history.append("s1", Role::User, "What is a tort?").await.unwrap();
        history
            .append("s1", Role::Assistant, "A tort is a civil wrong.")
            .await
            .unwrap();

        let context = history.get_context("s1").await.unwrap();
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].role, Role::User);
        assert_eq!(context[0].content, "What is a tort?");
        assert_eq!(context[1].role, Role::Assistant);
        assert_eq!(context[1].content, "A tort is a civil wrong.");
    }

    #[tokio::test]
    async fn store_assigns_increasing_ids_and_lists_in_order() {
        let store = MemoryMessageStore::new();

        let a = store.append("s1", Role::User, "first").await.unwrap();
        let b = store.append("s1", Role::Assistant, "second").await.unwrap();
        let c = store.append("s2", Role::User, "other session").await.unwrap();

        assert!(a.id < b.id);
        assert!(b.id < c.id);

        let turns = store.list("s1").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "first");
        assert_eq!(turns[1].content, "second");
    }

    #[tokio::test]
    async fn unknown_session_lists_empty() {
        let store = MemoryMessageStore::new();
        assert!(store.list("nobody").await.unwrap().is_empty());
    }
}
