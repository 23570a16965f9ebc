//! Process-local presence: in-memory dispatch, no transport.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::{Presence, PresenceError, Subscriber};

/// The in-memory [`Presence`] implementation.
///
/// Dispatch is synchronous: by the time `publish` returns, every
/// subscriber has run. Handlers are invoked outside the internal lock
/// so a handler may publish again without deadlocking.
#[derive(Default)]
pub struct LocalPresence {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    topics: HashMap<String, Vec<Subscriber>>,
    sets: HashMap<String, Vec<String>>,
}

impl LocalPresence {
    /// Creates an empty local presence.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock means a subscriber panicked mid-registration;
        // the maps themselves are still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait::async_trait]
impl Presence for LocalPresence {
    async fn subscribe(
        &self,
        topic: &str,
        handler: Subscriber,
    ) -> Result<(), PresenceError> {
        self.lock()
            .topics
            .entry(topic.to_string())
            .or_default()
            .push(handler);
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), PresenceError> {
        self.lock().topics.remove(topic);
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        data: serde_json::Value,
    ) -> Result<(), PresenceError> {
        let handlers = self
            .lock()
            .topics
            .get(topic)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            handler(data.clone());
        }
        Ok(())
    }

    async fn sadd(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), PresenceError> {
        let mut state = self.lock();
        let set = state.sets.entry(key.to_string()).or_default();
        if !set.iter().any(|v| v == value) {
            set.push(value.to_string());
        }
        Ok(())
    }

    async fn smembers(
        &self,
        key: &str,
    ) -> Result<Vec<String>, PresenceError> {
        Ok(self.lock().sets.get(key).cloned().unwrap_or_default())
    }

    async fn srem(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), PresenceError> {
        let mut state = self.lock();
        if let Some(set) = state.sets.get_mut(key) {
            set.retain(|v| v != value);
            if set.is_empty() {
                state.sets.remove(key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscriber_synchronously() {
        let presence = LocalPresence::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        presence
            .subscribe(
                "room:x",
                Arc::new(move |_| {
                    h.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await
            .unwrap();

        presence
            .publish("room:x", serde_json::json!({"kind": "lock"}))
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let presence = LocalPresence::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        presence
            .subscribe(
                "t",
                Arc::new(move |_| {
                    h.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await
            .unwrap();
        presence.unsubscribe("t").await.unwrap();
        presence.publish("t", serde_json::Value::Null).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sets_deduplicate_and_keep_insertion_order() {
        let presence = LocalPresence::new();
        presence.sadd("rooms", "b").await.unwrap();
        presence.sadd("rooms", "a").await.unwrap();
        presence.sadd("rooms", "b").await.unwrap();
        assert_eq!(
            presence.smembers("rooms").await.unwrap(),
            vec!["b".to_string(), "a".to_string()]
        );
    }

    #[tokio::test]
    async fn test_srem_and_missing_key() {
        let presence = LocalPresence::new();
        assert!(presence.smembers("nope").await.unwrap().is_empty());
        presence.sadd("k", "v").await.unwrap();
        presence.srem("k", "v").await.unwrap();
        assert!(presence.smembers("k").await.unwrap().is_empty());
    }
}
