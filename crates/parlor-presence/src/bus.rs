//! Bus-backed presence: several handles sharing one pub/sub medium.
//!
//! [`PresenceBus`] plays the role a networked broker (and its shared
//! key-value store) would play in a multi-process deployment. Each
//! matchmaking process holds one [`BusPresence`] handle; publishes on
//! any handle reach subscribers on every handle, and the set store is
//! shared. The handle satisfies the exact same [`Presence`] contract
//! as [`crate::LocalPresence`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::{Presence, PresenceError, Subscriber};

/// Broadcast channel depth. A full channel lags the slowest
/// subscriber rather than blocking publishers.
const BUS_CAPACITY: usize = 256;

/// The shared medium that [`BusPresence`] handles attach to.
#[derive(Clone)]
pub struct PresenceBus {
    tx: broadcast::Sender<(String, serde_json::Value)>,
    sets: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl PresenceBus {
    /// Creates a new, empty bus.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            tx,
            sets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Attaches a new presence handle to this bus.
    pub fn handle(&self) -> BusPresence {
        BusPresence {
            bus: self.clone(),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for PresenceBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One process's view of a shared [`PresenceBus`].
pub struct BusPresence {
    bus: PresenceBus,
    /// One relay task per (topic, handler) registration.
    subscriptions: Mutex<HashMap<String, Vec<JoinHandle<()>>>>,
}

impl BusPresence {
    fn lock_sets(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.bus.sets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for BusPresence {
    fn drop(&mut self) {
        let subs = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
        for task in subs.values().flatten() {
            task.abort();
        }
    }
}

#[async_trait::async_trait]
impl Presence for BusPresence {
    async fn subscribe(
        &self,
        topic: &str,
        handler: Subscriber,
    ) -> Result<(), PresenceError> {
        let mut rx = self.bus.tx.subscribe();
        let wanted = topic.to_string();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok((topic, data)) => {
                        if topic == wanted {
                            handler(data);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(
                            topic = %wanted,
                            missed,
                            "presence subscriber lagged"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(topic.to_string())
            .or_default()
            .push(task);
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), PresenceError> {
        let removed = self
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(topic);
        if let Some(tasks) = removed {
            for task in tasks {
                task.abort();
            }
        }
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        data: serde_json::Value,
    ) -> Result<(), PresenceError> {
        // A send error only means nobody is listening right now.
        let _ = self.bus.tx.send((topic.to_string(), data));
        Ok(())
    }

    async fn sadd(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), PresenceError> {
        let mut sets = self.lock_sets();
        let set = sets.entry(key.to_string()).or_default();
        if !set.iter().any(|v| v == value) {
            set.push(value.to_string());
        }
        Ok(())
    }

    async fn smembers(
        &self,
        key: &str,
    ) -> Result<Vec<String>, PresenceError> {
        Ok(self.lock_sets().get(key).cloned().unwrap_or_default())
    }

    async fn srem(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), PresenceError> {
        let mut sets = self.lock_sets();
        if let Some(set) = sets.get_mut(key) {
            set.retain(|v| v != value);
            if set.is_empty() {
                sets.remove(key);
            }
        }
        Ok(())
    }
}
