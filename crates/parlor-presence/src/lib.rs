//! Pub/sub and set-membership primitives for Parlor.
//!
//! The matchmaker coordinates through this seam: room lifecycle events
//! are published to topics, and a small set API tracks which rooms
//! exist where. Two implementations satisfy the same [`Presence`]
//! contract:
//!
//! - [`LocalPresence`]: in-memory, synchronous dispatch. The right
//!   choice for a single-process deployment.
//! - [`BusPresence`]: handles attached to a shared [`PresenceBus`],
//!   standing in for a networked pub/sub + key-value medium so that
//!   several matchmaker instances observe one another.
//!
//! Callers never branch on which variant is active; everything that
//! works against the trait works against both.

mod bus;
mod error;
mod local;

use std::sync::Arc;

pub use bus::{BusPresence, PresenceBus};
pub use error::PresenceError;
pub use local::LocalPresence;

/// A topic subscriber callback.
pub type Subscriber = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

/// Pub/sub plus set bookkeeping.
///
/// Per-topic delivery order matches publish order; across topics no
/// order is guaranteed. Set members keep insertion order and are
/// de-duplicated.
#[async_trait::async_trait]
pub trait Presence: Send + Sync {
    /// Registers `handler` for every future publish on `topic`.
    async fn subscribe(
        &self,
        topic: &str,
        handler: Subscriber,
    ) -> Result<(), PresenceError>;

    /// Drops every handler registered on `topic`.
    async fn unsubscribe(&self, topic: &str) -> Result<(), PresenceError>;

    /// Delivers `data` to every current subscriber of `topic`.
    async fn publish(
        &self,
        topic: &str,
        data: serde_json::Value,
    ) -> Result<(), PresenceError>;

    /// Adds `value` to the set at `key` (no-op if already present).
    async fn sadd(&self, key: &str, value: &str)
    -> Result<(), PresenceError>;

    /// Returns the members of the set at `key`, insertion-ordered.
    /// A missing key is an empty set.
    async fn smembers(&self, key: &str)
    -> Result<Vec<String>, PresenceError>;

    /// Removes `value` from the set at `key`.
    async fn srem(&self, key: &str, value: &str)
    -> Result<(), PresenceError>;
}
