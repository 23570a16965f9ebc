//! Room listing persistence.
//!
//! The matchmaker keeps its authoritative state in memory; drivers
//! mirror room summaries into whatever store backs cross-process
//! discovery. `LocalDriver` is the single-process store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use parlor_protocol::RoomSummary;

/// Field conditions for listing queries. Every pair must match the
/// serialized summary field of the same name.
pub type QueryConditions = serde_json::Map<String, serde_json::Value>;

/// One persisted room listing.
pub trait RoomListing: Send + Sync {
    /// Snapshot of the listed fields.
    fn summary(&self) -> RoomSummary;

    /// Applies field updates to the listing. Unknown fields are
    /// ignored.
    fn update_one(&self, changes: &QueryConditions);

    /// Flushes pending updates to the backing store.
    fn save(&self);

    /// Deletes the listing from the backing store.
    fn remove(&self);
}

/// Storage backend for room listings.
#[async_trait::async_trait]
pub trait MatchMakerDriver: Send + Sync {
    async fn create_instance(
        &self,
        initial: RoomSummary,
    ) -> Arc<dyn RoomListing>;

    async fn find(
        &self,
        conditions: &QueryConditions,
    ) -> Vec<Arc<dyn RoomListing>>;

    async fn find_one(
        &self,
        conditions: &QueryConditions,
    ) -> Option<Arc<dyn RoomListing>>;
}

fn matches(summary: &RoomSummary, conditions: &QueryConditions) -> bool {
    let Ok(serde_json::Value::Object(fields)) =
        serde_json::to_value(summary)
    else {
        return false;
    };
    conditions
        .iter()
        .all(|(key, value)| fields.get(key) == Some(value))
}

struct LocalListing {
    data: Mutex<RoomSummary>,
    removed: AtomicBool,
}

impl LocalListing {
    fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }
}

impl RoomListing for LocalListing {
    fn summary(&self) -> RoomSummary {
        self.data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn update_one(&self, changes: &QueryConditions) {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        for (key, value) in changes {
            match (key.as_str(), value) {
                ("clients", serde_json::Value::Number(n)) => {
                    if let Some(n) = n.as_u64() {
                        data.clients = n as u32;
                    }
                }
                ("max_clients", serde_json::Value::Number(n)) => {
                    if let Some(n) = n.as_u64() {
                        data.max_clients = n as u32;
                    }
                }
                ("locked", serde_json::Value::Bool(b)) => data.locked = *b,
                ("private", serde_json::Value::Bool(b)) => {
                    data.private = *b;
                }
                ("metadata", value) => data.metadata = value.clone(),
                _ => {}
            }
        }
    }

    fn save(&self) {
        // In-memory rows are live; nothing to flush.
    }

    fn remove(&self) {
        self.removed.store(true, Ordering::Release);
    }
}

/// In-memory driver used when all rooms live in one process.
#[derive(Default)]
pub struct LocalDriver {
    rows: Mutex<Vec<Arc<LocalListing>>>,
}

impl LocalDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_rows(&self) -> Vec<Arc<LocalListing>> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.retain(|row| !row.is_removed());
        rows.clone()
    }
}

#[async_trait::async_trait]
impl MatchMakerDriver for LocalDriver {
    async fn create_instance(
        &self,
        initial: RoomSummary,
    ) -> Arc<dyn RoomListing> {
        let row = Arc::new(LocalListing {
            data: Mutex::new(initial),
            removed: AtomicBool::new(false),
        });
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::clone(&row));
        row
    }

    async fn find(
        &self,
        conditions: &QueryConditions,
    ) -> Vec<Arc<dyn RoomListing>> {
        self.live_rows()
            .into_iter()
            .filter(|row| matches(&row.summary(), conditions))
            .map(|row| row as Arc<dyn RoomListing>)
            .collect()
    }

    async fn find_one(
        &self,
        conditions: &QueryConditions,
    ) -> Option<Arc<dyn RoomListing>> {
        self.live_rows()
            .into_iter()
            .find(|row| matches(&row.summary(), conditions))
            .map(|row| row as Arc<dyn RoomListing>)
    }
}
