//! Persisted view state for the conversation views.
//!
//! Every state change writes a [`Snapshot`] under a fixed key. Before writing,
//! loaders are dropped, only the most recent messages are kept, and long
//! fields are cut. The cut copy is read back only at start-up, so anything
//! outside the window is gone after a restart.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::mode::Mode;
use crate::state::Message;
use crate::storage::SharedStorage;

pub const CHAT_CACHE_KEY: &str = "chat_cache_v4";
pub const STUDIO_CACHE_KEY: &str = "image_chat_cache_v7";

/// Messages kept by the chat view
pub const CHAT_WINDOW: usize = 24;
/// Messages kept by the studio view
pub const STUDIO_WINDOW: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

/// Drop loaders, keep the newest `window` messages in their original order,
/// and trim each one
pub fn sanitize_messages(messages: &[Message], window: usize) -> Vec<Message> {
    let kept: Vec<&Message> = messages.iter().filter(|m| !m.is_loader()).collect();
    let start = kept.len().saturating_sub(window);
    kept[start..].iter().map(|m| m.trimmed()).collect()
}

pub struct ConversationCache {
    storage: SharedStorage,
    key: String,
    window: usize,
}

impl ConversationCache {
    pub fn new(storage: SharedStorage, key: &str, window: usize) -> Self {
        Self {
            storage,
            key: key.to_string(),
            window,
        }
    }

    pub fn chat(storage: SharedStorage) -> Self {
        Self::new(storage, CHAT_CACHE_KEY, CHAT_WINDOW)
    }

    pub fn studio(storage: SharedStorage) -> Self {
        Self::new(storage, STUDIO_CACHE_KEY, STUDIO_WINDOW)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored snapshot; a missing or unreadable entry gives an empty one
    pub fn load(&self) -> Snapshot {
        let Some(raw) = self.storage.get(&self.key) else {
            return Snapshot::default();
        };
        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(mut snapshot) => {
                snapshot.messages.retain(|m| !m.is_loader());
                debug!(key = %self.key, messages = snapshot.messages.len(), "restored cached conversation");
                snapshot
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "ignoring unreadable conversation cache");
                Snapshot::default()
            }
        }
    }

    /// Persist the current view state. Failures are swallowed; after a failed
    /// write one retry keeps only the input text.
    ///
    /// Returns whether the full snapshot was written.
    pub fn save(&self, messages: &[Message], input: &str, mode: Option<Mode>) -> bool {
        let snapshot = Snapshot {
            messages: sanitize_messages(messages, self.window),
            input: input.to_string(),
            mode,
        };

        match self.write(&snapshot) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.key, error = %e, "conversation cache write failed, retrying with input only");
                let reduced = Snapshot {
                    input: input.to_string(),
                    ..Snapshot::default()
                };
                if let Err(e) = self.write(&reduced) {
                    warn!(key = %self.key, error = %e, "reduced conversation cache write failed");
                }
                false
            }
        }
    }

    fn write(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.storage.set(&self.key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Conversation;
    use crate::payload::{Body, NewsDigest};
    use crate::storage::{MemoryStorage, SessionStorage};
    use std::sync::Arc;

    fn numbered(count: usize) -> Vec<Message> {
        (0..count)
            .map(|i| Message::user(&format!("m{}", i), Mode::Company, None))
            .collect()
    }

    #[test]
    fn test_sanitize_keeps_newest_in_order() {
        let mut messages = numbered(30);
        messages.insert(10, Message::loader());
        messages.push(Message::loader());

        let kept = sanitize_messages(&messages, CHAT_WINDOW);
        assert_eq!(kept.len(), 24);
        assert!(kept.iter().all(|m| !m.is_loader()));
        let texts: Vec<_> = kept.iter().map(|m| m.text.as_str()).collect();
        let expected: Vec<String> = (6..30).map(|i| format!("m{}", i)).collect();
        assert_eq!(texts, expected);
    }

    #[test]
    fn test_sanitize_short_list_keeps_everything() {
        let messages = numbered(3);
        assert_eq!(sanitize_messages(&messages, STUDIO_WINDOW), messages);
    }

    #[test]
    fn test_round_trip_is_ordered_truncated_subset() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let cache = ConversationCache::chat(storage.clone());

        let mut conv = Conversation::new();
        for i in 0..20 {
            let ticket = conv.submit(&format!("topic {}", i), Mode::News, None).unwrap();
            conv.resolve(ticket, Ok(Body::News(NewsDigest::default())));
        }
        conv.submit("pending", Mode::News, None).unwrap();

        assert!(cache.save(conv.messages(), "draft", Some(Mode::News)));
        let restored = ConversationCache::chat(storage).load();

        assert_eq!(restored.input, "draft");
        assert_eq!(restored.mode, Some(Mode::News));
        assert_eq!(restored.messages.len(), CHAT_WINDOW);
        assert!(restored.messages.iter().all(|m| !m.is_loader()));

        // Restored ids appear in the same relative order as in memory
        let live_ids: Vec<_> = conv.messages().iter().map(|m| m.id).collect();
        let positions: Vec<usize> = restored
            .messages
            .iter()
            .map(|m| live_ids.iter().position(|id| *id == m.id).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_load_missing_or_corrupt_gives_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = ConversationCache::studio(storage.clone());
        assert_eq!(cache.load(), Snapshot::default());

        storage.set(STUDIO_CACHE_KEY, "{not json").unwrap();
        assert_eq!(cache.load(), Snapshot::default());
    }

    #[test]
    fn test_quota_failure_falls_back_to_input_only() {
        let storage = Arc::new(MemoryStorage::with_quota(200));
        let cache = ConversationCache::studio(storage.clone());
        let messages = vec![Message::user(&"x".repeat(500), Mode::Image, None)];

        assert!(!cache.save(&messages, "half-typed", None));
        let restored = cache.load();
        assert!(restored.messages.is_empty());
        assert_eq!(restored.input, "half-typed");
    }

    #[test]
    fn test_total_write_failure_is_swallowed() {
        let storage = Arc::new(MemoryStorage::with_quota(1));
        let cache = ConversationCache::chat(storage);
        assert!(!cache.save(&numbered(2), "input", Some(Mode::Company)));
        assert_eq!(cache.load(), Snapshot::default());
    }
}
