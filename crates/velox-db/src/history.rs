use std::sync::Arc;

use tracing::debug;
use velox_common::{ConversationId, Result, Turn};

use crate::kv_store::KvStore;

/// Per-conversation sliding-window history on top of a [`KvStore`].
#[derive(Clone)]
pub struct ConversationMemory {
    store: Arc<dyn KvStore>,
    window: usize,
}

impl ConversationMemory {
    pub fn new(store: Arc<dyn KvStore>, window: usize) -> Self {
        Self { store, window }
    }

    /// Stored turns in insertion order. A missing entry is an empty history.
    pub async fn load(&self, id: &ConversationId) -> Result<Vec<Turn>> {
        match self.store.get(id.as_str()).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Truncate to the window and persist.
    pub async fn save(&self, id: &ConversationId, mut turns: Vec<Turn>) -> Result<()> {
        truncate_window(&mut turns, self.window);
        debug!("saving {} turns for conversation {id}", turns.len());
        let value = serde_json::to_value(&turns)?;
        self.store.put(id.as_str(), &value).await
    }

    pub async fn clear(&self, id: &ConversationId) -> Result<()> {
        self.store.delete(id.as_str()).await
    }
}

/// Drop the oldest turns until `turns.len() <= window`.
///
/// Turns are evicted two at a time so a user message never loses its reply.
/// With an odd window the result is therefore one shorter than the window.
pub fn truncate_window(turns: &mut Vec<Turn>, window: usize) {
    if turns.len() <= window {
        return;
    }
    let excess = turns.len() - window;
    let evict = (excess + excess % 2).min(turns.len());
    turns.drain(..evict);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv_store::InMemoryKvStore;
    use serde_json::json;
    use velox_common::Role;

    fn exchange(n: usize) -> Vec<Turn> {
        (0..n)
            .flat_map(|i| [Turn::user(format!("q{i}")), Turn::assistant(format!("a{i}"))])
            .collect()
    }

    #[test]
    fn truncate_keeps_most_recent_turns_in_order() {
        let mut turns = exchange(8);
        truncate_window(&mut turns, 10);

        assert_eq!(turns.len(), 10);
        assert_eq!(turns[0], Turn::user("q3"));
        assert_eq!(turns[9], Turn::assistant("a7"));
    }

    #[test]
    fn truncate_is_noop_within_window() {
        let mut turns = exchange(2);
        truncate_window(&mut turns, 10);
        assert_eq!(turns, exchange(2));
    }

    #[test]
    fn truncate_with_odd_window_evicts_whole_pairs() {
        let mut turns = exchange(3);
        truncate_window(&mut turns, 3);

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "q2");
    }

    #[tokio::test]
    async fn load_of_unknown_conversation_is_empty() {
        let memory = ConversationMemory::new(Arc::new(InMemoryKvStore::new()), 10);
        let turns = memory.load(&ConversationId::from(7_i64)).await.unwrap();
        assert!(turns.is_empty());
    }

    #[tokio::test]
    async fn save_truncates_before_writing() {
        let store = Arc::new(InMemoryKvStore::new());
        let memory = ConversationMemory::new(store.clone(), 4);
        let id = ConversationId::from(7_i64);

        memory.save(&id, exchange(5)).await.unwrap();

        let stored = store.get("7").await.unwrap().unwrap();
        assert_eq!(
            stored,
            json!([
                {"role": "user", "content": "q3"},
                {"role": "assistant", "content": "a3"},
                {"role": "user", "content": "q4"},
                {"role": "assistant", "content": "a4"},
            ])
        );
        assert_eq!(memory.load(&id).await.unwrap(), exchange(5)[6..].to_vec());
    }

    #[tokio::test]
    async fn load_rejects_malformed_history() {
        let store = Arc::new(InMemoryKvStore::new());
        store.put("7", &json!({"not": "a list"})).await.unwrap();
        let memory = ConversationMemory::new(store, 10);

        assert!(memory.load(&ConversationId::from(7_i64)).await.is_err());
    }

    #[tokio::test]
    async fn clear_removes_history() {
        let store = Arc::new(InMemoryKvStore::new());
        let memory = ConversationMemory::new(store.clone(), 10);
        let id = ConversationId::from(7_i64);

        memory.save(&id, exchange(1)).await.unwrap();
        memory.clear(&id).await.unwrap();

        assert!(store.is_empty());
    }
}
