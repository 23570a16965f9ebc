//! Room type registration: the `RoomHandler` trait game developers
//! implement, and the per-type record the matchmaker keeps.

use std::collections::HashMap;
use std::time::Duration;

use parlor_protocol::{ClientId, RoomId};

use crate::room::RoomControl;

/// Loosely typed options attached to a join or create request.
pub type ClientOptions = serde_json::Map<String, serde_json::Value>;

/// Factory producing a fresh handler per room instance.
pub type HandlerFactory =
    Box<dyn Fn() -> Box<dyn RoomHandler> + Send + Sync>;

/// A listener observing a room type's lifecycle events.
pub type EventListener = Box<dyn Fn(&RoomEvent) + Send + Sync>;

/// Default time a reserved seat stays valid before it is revoked.
pub const DEFAULT_SEAT_RESERVATION_TIME: Duration = Duration::from_secs(3);

/// The room simulation contract.
///
/// One handler instance exists per room. The matchmaker drives the
/// hooks; the handler drives lock/unlock/dispose through the
/// [`RoomControl`] it receives. Every hook has a default so simple
/// rooms implement only what they need.
#[async_trait::async_trait]
pub trait RoomHandler: Send {
    /// Runs once at creation, with the merged options (registered
    /// defaults win over caller keys). Returning `Err` aborts the
    /// creation.
    async fn on_init(
        &mut self,
        _options: &ClientOptions,
        _room: &mut RoomControl,
    ) -> Result<(), String> {
        Ok(())
    }

    /// Scores a prospective client. `0` rejects; among candidate
    /// rooms the strictly highest positive score wins.
    async fn request_join(&mut self, _options: &ClientOptions) -> u32 {
        1
    }

    /// Runs when a client consumes its seat and binds to the room.
    async fn on_join(
        &mut self,
        _client: &ClientId,
        _options: &ClientOptions,
        _room: &mut RoomControl,
    ) {
    }

    /// Runs when a client leaves (voluntarily or by disconnect).
    async fn on_leave(
        &mut self,
        _client: &ClientId,
        _room: &mut RoomControl,
    ) {
    }

    /// Receives room-data frames (and any message the core does not
    /// recognize, forwarded verbatim).
    fn on_message(
        &mut self,
        _client: &ClientId,
        _payload: &[u8],
        _room: &mut RoomControl,
    ) {
    }

    /// Runs exactly once when the room is torn down, including a
    /// creation that failed partway.
    async fn on_dispose(&mut self) {}
}

/// A lifecycle transition, as observed by registered listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomEventKind {
    Create,
    Join,
    Leave,
    Lock,
    Unlock,
    Dispose,
}

/// Payload delivered to lifecycle listeners, in emission order.
#[derive(Debug, Clone)]
pub struct RoomEvent {
    pub kind: RoomEventKind,
    pub room_id: RoomId,
    pub room_name: String,
    /// Set for Join and Leave.
    pub client_id: Option<ClientId>,
}

/// The registration record for one room type.
///
/// Created once by `register_handler` and immutable afterwards except
/// for listener registration.
pub struct RegisteredHandler {
    pub(crate) name: String,
    pub(crate) factory: HandlerFactory,
    /// Declared defaults; these win over colliding caller keys so
    /// server-configured room parameters stay stable.
    pub(crate) default_options: ClientOptions,
    pub(crate) seat_reservation_time: Duration,
    listeners: HashMap<RoomEventKind, Vec<EventListener>>,
}

impl RegisteredHandler {
    pub(crate) fn new(
        name: &str,
        factory: HandlerFactory,
        default_options: ClientOptions,
    ) -> Self {
        Self {
            name: name.to_string(),
            factory,
            default_options,
            seat_reservation_time: DEFAULT_SEAT_RESERVATION_TIME,
            listeners: HashMap::new(),
        }
    }

    /// Registers `listener` for `kind` events on rooms of this type.
    pub(crate) fn on(&mut self, kind: RoomEventKind, listener: EventListener) {
        self.listeners.entry(kind).or_default().push(listener);
    }

    pub(crate) fn emit(&self, event: &RoomEvent) {
        if let Some(listeners) = self.listeners.get(&event.kind) {
            tracing::trace!(
                room_name = %self.name,
                kind = ?event.kind,
                listeners = listeners.len(),
                "dispatching room event"
            );
            for listener in listeners {
                listener(event);
            }
        }
    }

    /// Merges caller options under the declared defaults.
    ///
    /// Caller keys that collide with a default are discarded, not
    /// overridden.
    pub(crate) fn merge_options(
        &self,
        caller: &ClientOptions,
    ) -> ClientOptions {
        let mut merged = caller.clone();
        for (key, value) in &self.default_options {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait::async_trait]
    impl RoomHandler for Noop {}

    fn registered(defaults: ClientOptions) -> RegisteredHandler {
        RegisteredHandler::new(
            "room",
            Box::new(|| Box::new(Noop) as Box<dyn RoomHandler>),
            defaults,
        )
    }

    #[test]
    fn test_defaults_win_over_caller_keys() {
        let mut defaults = ClientOptions::new();
        defaults.insert("level".into(), serde_json::json!(1));

        let mut caller = ClientOptions::new();
        caller.insert("level".into(), serde_json::json!(2));
        caller.insert("map".into(), serde_json::json!("forest"));

        let merged = registered(defaults).merge_options(&caller);
        assert_eq!(merged["level"], serde_json::json!(1));
        assert_eq!(merged["map"], serde_json::json!("forest"));
    }

    #[test]
    fn test_merge_with_no_defaults_keeps_caller_options() {
        let mut caller = ClientOptions::new();
        caller.insert("map".into(), serde_json::json!("desert"));

        let merged = registered(ClientOptions::new()).merge_options(&caller);
        assert_eq!(merged, caller);
    }

    #[test]
    fn test_emit_reaches_every_listener_for_kind() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let mut reg = registered(ClientOptions::new());
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let h = Arc::clone(&hits);
            reg.on(
                RoomEventKind::Lock,
                Box::new(move |_| {
                    h.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        reg.emit(&RoomEvent {
            kind: RoomEventKind::Lock,
            room_id: RoomId::from("a1B2c3D4e"),
            room_name: "room".into(),
            client_id: None,
        });
        reg.emit(&RoomEvent {
            kind: RoomEventKind::Unlock,
            room_id: RoomId::from("a1B2c3D4e"),
            room_name: "room".into(),
            client_id: None,
        });
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
