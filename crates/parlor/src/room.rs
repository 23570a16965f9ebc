//! Room instance state: lifecycle machine, control surface, and the
//! per-room record the matchmaker owns.
//!
//! Three pieces live here, and the split matters:
//! - [`RoomLifecycle`] is the state machine a room moves through.
//! - [`RoomControl`] is what handler hooks see. It does NOT mutate
//!   anything: it records lock/unlock/dispose/metadata requests, and
//!   the matchmaker applies them after the hook returns. A hook runs
//!   while the matchmaker's lock is held, so letting it reach back in
//!   directly would deadlock; buffering keeps hooks simple and keeps
//!   every state change flowing through one place.
//! - `RoomInstance` is the registry record itself: the handler box,
//!   the bound clients, and the listing fields a summary is cut from.
//!   It is `pub(crate)` on purpose; outside the crate a room is only
//!   ever an id plus a [`RoomSummary`](parlor_protocol::RoomSummary).

use std::fmt;

use parlor_protocol::{ClientId, RoomId, RoomSummary};
use tokio::task::JoinHandle;

use crate::handler::RoomHandler;

/// Maximum clients when a room never sets a bound.
pub const UNBOUNDED_CLIENTS: u32 = u32::MAX;

/// The lifecycle state of a room.
///
/// ```text
/// Creating → Unlocked ⇄ Locked
///                │         │
///                └──→ Disposing ──→ Disposed
/// ```
///
/// Only `Unlocked` rooms are eligible for scored join selection.
/// Disposal can start from either live state and happens exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomLifecycle {
    Creating,
    Unlocked,
    Locked,
    Disposing,
    Disposed,
}

impl RoomLifecycle {
    /// Returns `true` if the room can appear in scored selection.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Unlocked)
    }

    /// Returns `true` while the room is reachable by id.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Unlocked | Self::Locked)
    }
}

impl fmt::Display for RoomLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creating => write!(f, "Creating"),
            Self::Unlocked => write!(f, "Unlocked"),
            Self::Locked => write!(f, "Locked"),
            Self::Disposing => write!(f, "Disposing"),
            Self::Disposed => write!(f, "Disposed"),
        }
    }
}

/// A state change a handler hook asked for.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ControlAction {
    Lock,
    Unlock,
    Dispose,
    SetMaxClients(u32),
    SetMetadata(serde_json::Value),
    SetPrivate(bool),
}

/// The control surface handed to handler hooks.
///
/// Hooks run while the matchmaker holds the room, so they cannot
/// mutate matchmaker state directly. Instead they record requests
/// here; the matchmaker applies them in order once the hook returns,
/// which keeps lifecycle events ordered per room.
#[derive(Debug, Default)]
pub struct RoomControl {
    pub(crate) actions: Vec<ControlAction>,
}

impl RoomControl {
    /// Removes the room from join selection until unlocked.
    pub fn lock(&mut self) {
        self.actions.push(ControlAction::Lock);
    }

    /// Makes the room eligible for join selection again. A no-op on a
    /// room that is not locked.
    pub fn unlock(&mut self) {
        self.actions.push(ControlAction::Unlock);
    }

    /// Tears the room down.
    pub fn dispose(&mut self) {
        self.actions.push(ControlAction::Dispose);
    }

    /// Caps the room's occupancy (bound clients plus live seat
    /// reservations).
    pub fn set_max_clients(&mut self, max: u32) {
        self.actions.push(ControlAction::SetMaxClients(max));
    }

    /// Replaces the room's listing metadata.
    pub fn set_metadata(&mut self, metadata: serde_json::Value) {
        self.actions.push(ControlAction::SetMetadata(metadata));
    }

    /// Hides or reveals the room in public listings.
    pub fn set_private(&mut self, private: bool) {
        self.actions.push(ControlAction::SetPrivate(private));
    }
}

/// One live room, owned by the matchmaker of the hosting process.
pub(crate) struct RoomInstance {
    pub(crate) room_id: RoomId,
    pub(crate) room_name: String,
    pub(crate) max_clients: u32,
    pub(crate) lifecycle: RoomLifecycle,
    /// Bound clients, in join order.
    pub(crate) clients: Vec<ClientId>,
    pub(crate) metadata: serde_json::Value,
    pub(crate) private: bool,
    pub(crate) handler: Box<dyn RoomHandler>,
    /// Creation-grace timer: fires once, seat-reservation-time after
    /// creation, and disposes the room if still empty. Aborted on
    /// dispose.
    pub(crate) grace_timer: Option<JoinHandle<()>>,
}

impl RoomInstance {
    pub(crate) fn new(
        room_id: RoomId,
        room_name: String,
        handler: Box<dyn RoomHandler>,
    ) -> Self {
        Self {
            room_id,
            room_name,
            max_clients: UNBOUNDED_CLIENTS,
            lifecycle: RoomLifecycle::Creating,
            clients: Vec::new(),
            metadata: serde_json::Value::Null,
            private: false,
            handler,
            grace_timer: None,
        }
    }

    pub(crate) fn locked(&self) -> bool {
        self.lifecycle == RoomLifecycle::Locked
    }

    pub(crate) fn summary(&self, process_id: &str) -> RoomSummary {
        RoomSummary {
            clients: self.clients.len() as u32,
            locked: self.locked(),
            private: self.private,
            max_clients: self.max_clients,
            metadata: self.metadata.clone(),
            name: self.room_name.clone(),
            process_id: process_id.to_string(),
            room_id: self.room_id.clone(),
        }
    }
}
