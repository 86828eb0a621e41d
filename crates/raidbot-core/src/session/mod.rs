//! Conversation history for the chat endpoint.
//!
//! A bounded in-memory map keyed by conversation id. Each conversation keeps
//! only its most recent messages, the map holds at most `capacity`
//! conversations, and idle conversations are dropped by an explicit
//! [`ConversationStore::evict_expired`] call from the sweeper task.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationMessage {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Conversation {
    messages: VecDeque<ConversationMessage>,
    updated_at: DateTime<Utc>,
}

/// Bounds for a [`ConversationStore`].
#[derive(Debug, Clone, Copy)]
pub struct ConversationLimits {
    /// Messages kept per conversation.
    pub max_messages: usize,
    /// Idle time after which a conversation is evicted.
    pub max_age: Duration,
    /// Conversations kept at most.
    pub capacity: usize,
}

impl Default for ConversationLimits {
    fn default() -> Self {
        Self {
            max_messages: 10,
            max_age: Duration::hours(1),
            capacity: 1000,
        }
    }
}

pub struct ConversationStore {
    limits: ConversationLimits,
    conversations: HashMap<String, Conversation>,
}

impl ConversationStore {
    pub fn new(limits: ConversationLimits) -> Self {
        Self {
            limits,
            conversations: HashMap::new(),
        }
    }

    /// Record one user/assistant exchange.
    pub fn append(&mut self, id: &str, user: &str, assistant: &str, now: DateTime<Utc>) {
        if !self.conversations.contains_key(id) {
            self.make_room();
        }

        let max_messages = self.limits.max_messages;
        let conversation = self
            .conversations
            .entry(id.to_string())
            .or_insert_with(|| Conversation {
                messages: VecDeque::new(),
                updated_at: now,
            });

        for (role, content) in [("user", user), ("assistant", assistant)] {
            conversation.messages.push_back(ConversationMessage {
                role: role.into(),
                content: content.into(),
                timestamp: now,
            });
        }
        while conversation.messages.len() > max_messages {
            conversation.messages.pop_front();
        }
        conversation.updated_at = now;
    }

    /// Messages of a conversation, oldest first. Empty for unknown ids.
    pub fn history(&self, id: &str) -> Vec<ConversationMessage> {
        self.conversations
            .get(id)
            .map(|c| c.messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop conversations idle for longer than `max_age`. Returns how many.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let max_age = self.limits.max_age;
        let before = self.conversations.len();
        self.conversations
            .retain(|_, c| now - c.updated_at <= max_age);
        let evicted = before - self.conversations.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.conversations.len(), "Evicted idle conversations");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Evict least recently updated conversations until one more fits.
    fn make_room(&mut self) {
        while self.conversations.len() >= self.limits.capacity.max(1) {
            let oldest = self
                .conversations
                .iter()
                .min_by_key(|(_, c)| c.updated_at)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    self.conversations.remove(&id);
                }
                None => break,
            }
        }
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(ConversationLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_history() {
        let mut store = ConversationStore::default();
        let now = Utc::now();
        store.append("c1", "hello", "Hello! I am your RAID assistant.", now);

        let history = store.history("c1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].role, "assistant");
        assert!(store.history("missing").is_empty());
    }

    #[test]
    fn test_history_is_capped() {
        let mut store = ConversationStore::default();
        let now = Utc::now();
        for i in 0..8 {
            store.append("c1", &format!("question {}", i), "answer", now);
        }

        let history = store.history("c1");
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].content, "question 3");
    }

    #[test]
    fn test_evict_expired() {
        let mut store = ConversationStore::default();
        let t0 = Utc::now();
        store.append("old", "hi", "hello", t0);
        store.append("new", "hi", "hello", t0 + Duration::minutes(50));

        assert_eq!(store.evict_expired(t0 + Duration::minutes(30)), 0);
        assert_eq!(store.evict_expired(t0 + Duration::minutes(61)), 1);
        assert_eq!(store.len(), 1);
        assert!(store.history("old").is_empty());
    }

    #[test]
    fn test_capacity_drops_least_recent() {
        let mut store = ConversationStore::new(ConversationLimits {
            capacity: 2,
            ..ConversationLimits::default()
        });
        let t0 = Utc::now();
        store.append("a", "1", "1", t0);
        store.append("b", "2", "2", t0 + Duration::seconds(1));
        store.append("a", "3", "3", t0 + Duration::seconds(2));
        store.append("c", "4", "4", t0 + Duration::seconds(3));

        assert_eq!(store.len(), 2);
        assert!(store.history("b").is_empty());
        assert_eq!(store.history("a").len(), 4);
    }
}
