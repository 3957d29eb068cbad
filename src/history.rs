//! Per-session conversation transcripts.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::model::{Role, Turn};

/// Storage for chat transcripts, keyed by user and session.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn record(&self, turn: Turn);
    async fn history(&self, user_id: &str, session_id: &str) -> Vec<Turn>;
}

/// In-memory transcript store. Turns are appended in arrival order, so a
/// session's history reads back as the conversation happened.
#[derive(Default)]
pub struct InMemoryTranscript {
    turns: DashMap<(String, String), Vec<Turn>>,
}

impl InMemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscript {
    async fn record(&self, turn: Turn) {
        let key = (turn.user_id.clone(), turn.session_id.clone());
        self.turns.entry(key).or_default().push(turn);
    }

    async fn history(&self, user_id: &str, session_id: &str) -> Vec<Turn> {
        self.turns
            .get(&(user_id.to_string(), session_id.to_string()))
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

/// Build a [`Turn`] stamped with the current time.
pub fn turn(user_id: &str, session_id: &str, role: Role, text: &str) -> Turn {
    Turn {
        user_id: user_id.to_string(),
        session_id: session_id.to_string(),
        role,
        text: text.to_string(),
        intent: None,
        category: None,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_is_per_session_and_ordered() {
        let store = InMemoryTranscript::new();
        store.record(turn("u1", "s1", Role::User, "hello")).await;
        store.record(turn("u1", "s1", Role::Assistant, "hi there")).await;
        store.record(turn("u1", "s2", Role::User, "other session")).await;

        let h = store.history("u1", "s1").await;
        assert_eq!(h.len(), 2);
        assert_eq!(h[0].role, Role::User);
        assert_eq!(h[0].text, "hello");
        assert_eq!(h[1].role, Role::Assistant);

        assert_eq!(store.history("u1", "s2").await.len(), 1);
        assert!(store.history("u2", "s1").await.is_empty());
    }
}
