//! The matchmaker: the central authority over every room in the
//! process.
//!
//! This is the piece everything else hangs off. It's responsible for:
//! - Registering room types (a factory plus default options per name)
//! - Resolving join requests to rooms through scored selection
//! - Holding seats under expiry timers while clients connect
//! - Driving room lifecycle (create, lock/unlock, dispose) and fanning
//!   events out to listeners and to presence
//! - Dispatching decoded client frames to the rooms a client occupies
//!
//! # Concurrency note
//!
//! `MatchMaker` is a cheap-clone handle: every clone shares one
//! `Arc<tokio::sync::Mutex<Inner>>`, and `Inner` owns every mutable
//! index (rooms by id, available rooms by name, client bindings,
//! reservations). One lock instead of many means no lock-ordering
//! rules to get wrong, and it's a tokio mutex (not `std`) because
//! room handler hooks are awaited while it is held. Timer tasks are
//! plain `tokio::spawn`ed sleeps that clone the handle and call back
//! in; they take the same lock, so they see exactly the state any
//! other caller would.
//!
//! Room hooks run under that lock, which is what makes the deferred
//! [`RoomControl`] dance necessary: a hook cannot call back into the
//! matchmaker (the lock is already held), so it records requests and
//! the matchmaker applies them right after the hook returns.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parlor_presence::Presence;
use parlor_protocol::{ClientId, Message, RoomId, RoomSummary};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::MatchMakeError;
use crate::client::Client;
use crate::handler::{
    ClientOptions, DEFAULT_SEAT_RESERVATION_TIME, EventListener,
    HandlerFactory, RegisteredHandler, RoomEvent, RoomEventKind,
};
use crate::room::{ControlAction, RoomControl, RoomInstance, RoomLifecycle};

/// Presence set key holding the live room ids of one room type.
fn roomlist_key(room_name: &str) -> String {
    format!("roomlist:{room_name}")
}

/// Presence topic carrying one room's lifecycle events.
fn room_topic(room_id: &RoomId) -> String {
    format!("room:{room_id}")
}

/// One unconsumed seat: the options the client joined with, and the
/// one-shot task that revokes the seat at the deadline.
struct Reservation {
    options: ClientOptions,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct Inner {
    handlers: HashMap<String, RegisteredHandler>,
    rooms: HashMap<RoomId, RoomInstance>,
    /// Unlocked rooms per type. Scored selection walks this in order,
    /// so the first entry wins score ties.
    available: HashMap<String, Vec<RoomId>>,
    /// Rooms each client currently occupies, in join order.
    bindings: HashMap<ClientId, Vec<RoomId>>,
    reservations: HashMap<RoomId, HashMap<ClientId, Reservation>>,
    /// Every id ever issued in this process; ids are never reused.
    issued_ids: HashSet<String>,
}

/// The matchmaking and room-lifecycle core.
#[derive(Clone)]
pub struct MatchMaker {
    inner: Arc<Mutex<Inner>>,
    presence: Arc<dyn Presence>,
    process_id: String,
}

impl MatchMaker {
    /// Creates a matchmaker for this process, coordinating through
    /// `presence`.
    pub fn new(presence: Arc<dyn Presence>, process_id: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            presence,
            process_id: process_id.to_string(),
        }
    }

    /// This process's id, as stamped into room summaries.
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    // -- registration -----------------------------------------------------

    /// Records a room type. Fails if `name` is already registered.
    pub async fn register_handler(
        &self,
        name: &str,
        factory: HandlerFactory,
        default_options: ClientOptions,
    ) -> Result<(), MatchMakeError> {
        let mut inner = self.inner.lock().await;
        if inner.handlers.contains_key(name) {
            return Err(MatchMakeError::HandlerExists(name.to_string()));
        }
        inner.handlers.insert(
            name.to_string(),
            RegisteredHandler::new(name, factory, default_options),
        );
        inner.available.entry(name.to_string()).or_default();
        tracing::info!(room_name = name, "handler registered");
        Ok(())
    }

    /// Returns `true` if `name` is a registered room type.
    pub async fn has_handler(&self, name: &str) -> bool {
        self.inner.lock().await.handlers.contains_key(name)
    }

    /// Overrides how long reserved seats stay valid for rooms of this
    /// type.
    pub async fn set_seat_reservation_time(
        &self,
        name: &str,
        time: Duration,
    ) -> Result<(), MatchMakeError> {
        let mut inner = self.inner.lock().await;
        let reg = inner
            .handlers
            .get_mut(name)
            .ok_or_else(|| MatchMakeError::HandlerNotFound(name.to_string()))?;
        reg.seat_reservation_time = time;
        Ok(())
    }

    /// Registers a lifecycle listener for rooms of type `name`.
    pub async fn on_room_event(
        &self,
        name: &str,
        kind: RoomEventKind,
        listener: EventListener,
    ) -> Result<(), MatchMakeError> {
        let mut inner = self.inner.lock().await;
        let reg = inner
            .handlers
            .get_mut(name)
            .ok_or_else(|| MatchMakeError::HandlerNotFound(name.to_string()))?;
        reg.on(kind, listener);
        Ok(())
    }

    // -- join paths -------------------------------------------------------

    /// Resolves a join request to a room and reserves a seat for the
    /// client under an expiry timer.
    ///
    /// `room_name_or_id` is treated as a room id when it passes id
    /// syntax, otherwise as a room type name; name resolution falls
    /// back to creation only when `allow_create` is set.
    pub async fn on_join_room_request(
        &self,
        client_id: &ClientId,
        room_name_or_id: &str,
        client_options: &ClientOptions,
        allow_create: bool,
    ) -> Result<RoomId, MatchMakeError> {
        let mut inner = self.inner.lock().await;

        let room_id = if RoomId::is_valid(room_name_or_id) {
            let id = RoomId::from(room_name_or_id);
            self.admit_by_id(&mut inner, &id, client_options).await?
        } else if inner.handlers.contains_key(room_name_or_id) {
            match self
                .select_room(&mut inner, room_name_or_id, client_options)
                .await
            {
                Some(id) => id,
                None if allow_create => {
                    self.create_room(
                        &mut inner,
                        room_name_or_id,
                        client_options,
                    )
                    .await?
                }
                None => {
                    return Err(MatchMakeError::JoinRequestFailed(
                        room_name_or_id.to_string(),
                    ));
                }
            }
        } else {
            return Err(MatchMakeError::InvalidRoomId(
                room_name_or_id.to_string(),
            ));
        };

        self.reserve_seat(
            &mut inner,
            &room_id,
            client_id,
            client_options.clone(),
        );
        Ok(room_id)
    }

    /// Creates a room of type `room_name` and reserves nothing.
    pub async fn create(
        &self,
        room_name: &str,
        client_options: &ClientOptions,
    ) -> Result<RoomId, MatchMakeError> {
        let mut inner = self.inner.lock().await;
        self.create_room(&mut inner, room_name, client_options).await
    }

    /// Scored selection among the unlocked rooms of `room_name`.
    ///
    /// Returns `None` when no unlocked room exists or every candidate
    /// scores zero (or is at capacity, counting live reservations).
    pub async fn request_to_join_room(
        &self,
        room_name: &str,
        client_options: &ClientOptions,
    ) -> Option<RoomId> {
        let mut inner = self.inner.lock().await;
        self.select_room(&mut inner, room_name, client_options).await
    }

    /// Direct id lookup plus admission check. Reserves nothing.
    pub async fn join_by_id(
        &self,
        room_id: &RoomId,
        client_options: &ClientOptions,
    ) -> Result<RoomId, MatchMakeError> {
        let mut inner = self.inner.lock().await;
        self.admit_by_id(&mut inner, room_id, client_options).await
    }

    /// Consumes the client's seat reservation and binds it to the
    /// room.
    ///
    /// Called when the client's transport handshake completes. Fails
    /// with `ReservationExpired` if no live reservation exists for
    /// `(room_id, client.id)`.
    pub async fn on_join(
        &self,
        room_id: &RoomId,
        client: &Client,
    ) -> Result<(), MatchMakeError> {
        let mut inner = self.inner.lock().await;

        let reservation = inner
            .reservations
            .get_mut(room_id)
            .and_then(|seats| seats.remove(&client.id))
            .ok_or_else(|| {
                MatchMakeError::ReservationExpired(
                    room_id.clone(),
                    client.id.clone(),
                )
            })?;
        reservation.timer.abort();

        let mut control = RoomControl::default();
        let room_name = {
            let room = inner.rooms.get_mut(room_id).ok_or_else(|| {
                MatchMakeError::RoomNotFound(room_id.clone())
            })?;
            room.clients.push(client.id.clone());
            room.handler
                .on_join(&client.id, &reservation.options, &mut control)
                .await;
            room.room_name.clone()
        };

        inner
            .bindings
            .entry(client.id.clone())
            .or_default()
            .push(room_id.clone());

        self.emit(
            &inner,
            RoomEventKind::Join,
            room_id,
            &room_name,
            Some(&client.id),
        );
        tracing::info!(%room_id, client_id = %client.id, "client joined");
        self.apply_control(&mut inner, room_id, control).await;
        Ok(())
    }

    // -- message dispatch -------------------------------------------------

    /// Dispatches a decoded client frame.
    ///
    /// Join requests resolve through the join flow (a failure pushes a
    /// JOIN_ERROR frame back at the client); leaves and room data go
    /// to the rooms the client occupies; anything unrecognized is
    /// forwarded verbatim to every occupied room.
    pub async fn execute(&self, client: &Client, message: Message) {
        match message {
            Message::JoinRequest {
                request_id: _,
                room,
                process_id: _,
            } => {
                let mut options = ClientOptions::new();
                options.insert(
                    "clientId".to_string(),
                    serde_json::Value::String(client.id.as_str().to_string()),
                );
                if let Err(err) = self
                    .on_join_room_request(&client.id, &room, &options, false)
                    .await
                {
                    tracing::debug!(client_id = %client.id, %err, "join request refused");
                    client.send_message(&Message::JoinError {
                        message: err.to_string(),
                    });
                }
            }
            Message::LeaveRoom => {
                let mut inner = self.inner.lock().await;
                let bound = inner
                    .bindings
                    .get(&client.id)
                    .cloned()
                    .unwrap_or_default();
                for room_id in bound {
                    self.leave_room(&mut inner, &room_id, &client.id, false)
                        .await;
                }
            }
            Message::RoomData { payload } => {
                self.forward_to_bound(&client.id, &payload).await;
            }
            other => match other.encode() {
                Ok(bytes) => {
                    self.forward_to_bound(&client.id, &bytes).await;
                }
                Err(err) => {
                    tracing::warn!(client_id = %client.id, %err, "unforwardable frame");
                }
            },
        }
    }

    /// Forces a leave on every room the client occupies and clears
    /// its binding.
    pub async fn disconnect(&self, client_id: &ClientId) {
        let mut inner = self.inner.lock().await;
        let bound = inner.bindings.remove(client_id).unwrap_or_default();
        for room_id in bound {
            self.leave_room(&mut inner, &room_id, client_id, true).await;
        }
    }

    /// Removes the client from one room.
    pub async fn leave(&self, room_id: &RoomId, client_id: &ClientId) {
        let mut inner = self.inner.lock().await;
        self.leave_room(&mut inner, room_id, client_id, false).await;
    }

    // -- explicit lifecycle -----------------------------------------------

    /// Removes the room from join selection.
    pub async fn lock_room(&self, room_id: &RoomId) {
        let mut inner = self.inner.lock().await;
        self.lock_room_inner(&mut inner, room_id).await;
    }

    /// Returns a locked room to join selection. A no-op on a room
    /// that is not locked: no Unlock event fires.
    pub async fn unlock_room(&self, room_id: &RoomId) {
        let mut inner = self.inner.lock().await;
        self.unlock_room_inner(&mut inner, room_id).await;
    }

    /// Tears a room down explicitly.
    pub async fn dispose_room(&self, room_id: &RoomId) {
        let mut inner = self.inner.lock().await;
        self.dispose(&mut inner, room_id).await;
    }

    // -- queries ----------------------------------------------------------

    /// Returns `true` while the room is reachable by id.
    pub async fn has_room(&self, room_id: &RoomId) -> bool {
        self.inner.lock().await.rooms.contains_key(room_id)
    }

    /// Returns the listing summary for one room.
    pub async fn room_summary(
        &self,
        room_id: &RoomId,
    ) -> Option<RoomSummary> {
        let inner = self.inner.lock().await;
        inner
            .rooms
            .get(room_id)
            .map(|room| room.summary(&self.process_id))
    }

    /// Returns listing summaries for every live room.
    pub async fn room_summaries(&self) -> Vec<RoomSummary> {
        let inner = self.inner.lock().await;
        inner
            .rooms
            .values()
            .map(|room| room.summary(&self.process_id))
            .collect()
    }

    /// Returns the rooms a client currently occupies, in join order.
    pub async fn bound_rooms(&self, client_id: &ClientId) -> Vec<RoomId> {
        self.inner
            .lock()
            .await
            .bindings
            .get(client_id)
            .cloned()
            .unwrap_or_default()
    }

    // -- internals --------------------------------------------------------

    async fn create_room(
        &self,
        inner: &mut Inner,
        room_name: &str,
        client_options: &ClientOptions,
    ) -> Result<RoomId, MatchMakeError> {
        let (handler, options, seat_time) = {
            let reg = inner.handlers.get(room_name).ok_or_else(|| {
                MatchMakeError::HandlerNotFound(room_name.to_string())
            })?;
            (
                (reg.factory)(),
                reg.merge_options(client_options),
                reg.seat_reservation_time,
            )
        };

        let room_id = self.generate_room_id(inner);
        let mut room = RoomInstance::new(
            room_id.clone(),
            room_name.to_string(),
            handler,
        );

        let mut control = RoomControl::default();
        if let Err(reason) =
            room.handler.on_init(&options, &mut control).await
        {
            room.handler.on_dispose().await;
            return Err(MatchMakeError::RoomCreationFailed(
                room_name.to_string(),
                reason,
            ));
        }
        if room.handler.request_join(&options).await == 0 {
            room.handler.on_dispose().await;
            return Err(MatchMakeError::RoomCreationFailed(
                room_name.to_string(),
                "initial admission check rejected the request".to_string(),
            ));
        }

        // Rooms always start unlocked. The creation-grace timer keeps
        // an empty room alive long enough for its first client to
        // reserve and connect.
        room.lifecycle = RoomLifecycle::Unlocked;
        room.grace_timer =
            Some(self.spawn_grace_timer(room_id.clone(), seat_time));
        inner.rooms.insert(room_id.clone(), room);
        inner
            .available
            .entry(room_name.to_string())
            .or_default()
            .push(room_id.clone());

        self.emit(inner, RoomEventKind::Create, &room_id, room_name, None);
        if let Err(err) = self
            .presence
            .sadd(&roomlist_key(room_name), room_id.as_str())
            .await
        {
            tracing::warn!(%room_id, %err, "presence sadd failed");
        }
        self.publish_lifecycle(&room_id, room_name, "create").await;
        tracing::info!(%room_id, room_name, "room created");

        self.apply_control(inner, &room_id, control).await;
        Ok(room_id)
    }

    async fn select_room(
        &self,
        inner: &mut Inner,
        room_name: &str,
        client_options: &ClientOptions,
    ) -> Option<RoomId> {
        let candidates = inner.available.get(room_name)?.clone();
        let mut best: Option<(RoomId, u32)> = None;

        for room_id in candidates {
            let reserved = inner
                .reservations
                .get(&room_id)
                .map_or(0, |seats| seats.len());
            let Some(room) = inner.rooms.get_mut(&room_id) else {
                continue;
            };
            if !room.lifecycle.is_available() {
                continue;
            }
            let occupancy = (room.clients.len() + reserved) as u64;
            if occupancy >= u64::from(room.max_clients) {
                continue;
            }

            let score = room.handler.request_join(client_options).await;
            // Strictly-greater keeps the first-seen candidate on ties
            // and never selects a zero score.
            if score > best.as_ref().map_or(0, |(_, s)| *s) {
                best = Some((room_id, score));
            }
        }

        best.map(|(room_id, _)| room_id)
    }

    async fn admit_by_id(
        &self,
        inner: &mut Inner,
        room_id: &RoomId,
        client_options: &ClientOptions,
    ) -> Result<RoomId, MatchMakeError> {
        let room = inner
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| MatchMakeError::RoomNotFound(room_id.clone()))?;
        if room.handler.request_join(client_options).await == 0 {
            return Err(MatchMakeError::AdmissionRejected(room_id.clone()));
        }
        Ok(room_id.clone())
    }

    fn reserve_seat(
        &self,
        inner: &mut Inner,
        room_id: &RoomId,
        client_id: &ClientId,
        options: ClientOptions,
    ) {
        let seat_time = inner
            .rooms
            .get(room_id)
            .and_then(|room| inner.handlers.get(&room.room_name))
            .map(|reg| reg.seat_reservation_time)
            .unwrap_or(DEFAULT_SEAT_RESERVATION_TIME);

        let seats =
            inner.reservations.entry(room_id.clone()).or_default();
        // Re-reserving resets the expiry; timers never stack.
        if let Some(existing) = seats.remove(client_id) {
            existing.timer.abort();
        }
        let timer = self.spawn_expiry_timer(
            room_id.clone(),
            client_id.clone(),
            seat_time,
        );
        seats.insert(client_id.clone(), Reservation { options, timer });
        tracing::debug!(%room_id, %client_id, "seat reserved");
    }

    fn spawn_expiry_timer(
        &self,
        room_id: RoomId,
        client_id: ClientId,
        after: Duration,
    ) -> JoinHandle<()> {
        let matchmaker = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            matchmaker.expire_seat(&room_id, &client_id).await;
        })
    }

    fn spawn_grace_timer(
        &self,
        room_id: RoomId,
        after: Duration,
    ) -> JoinHandle<()> {
        let matchmaker = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let mut inner = matchmaker.inner.lock().await;
            // Clear our own handle first so disposal never aborts the
            // task that is running it.
            if let Some(room) = inner.rooms.get_mut(&room_id) {
                room.grace_timer = None;
            }
            matchmaker.dispose_if_empty(&mut inner, &room_id).await;
        })
    }

    async fn expire_seat(&self, room_id: &RoomId, client_id: &ClientId) {
        let mut inner = self.inner.lock().await;
        let removed = inner
            .reservations
            .get_mut(room_id)
            .and_then(|seats| seats.remove(client_id));
        if removed.is_none() {
            // Consumed or already revoked.
            return;
        }
        if inner
            .reservations
            .get(room_id)
            .is_some_and(|seats| seats.is_empty())
        {
            inner.reservations.remove(room_id);
        }
        tracing::debug!(%room_id, %client_id, "seat reservation expired");
        self.dispose_if_empty(&mut inner, room_id).await;
    }

    async fn leave_room(
        &self,
        inner: &mut Inner,
        room_id: &RoomId,
        client_id: &ClientId,
        disconnect: bool,
    ) {
        let mut control = RoomControl::default();
        let room_name = {
            let Some(room) = inner.rooms.get_mut(room_id) else {
                return;
            };
            let Some(pos) =
                room.clients.iter().position(|c| c == client_id)
            else {
                return;
            };
            room.clients.remove(pos);
            room.handler.on_leave(client_id, &mut control).await;
            room.room_name.clone()
        };

        if !disconnect {
            let now_empty = inner
                .bindings
                .get_mut(client_id)
                .map(|bound| {
                    bound.retain(|r| r != room_id);
                    bound.is_empty()
                })
                .unwrap_or(false);
            if now_empty {
                inner.bindings.remove(client_id);
            }
        }

        self.emit(
            inner,
            RoomEventKind::Leave,
            room_id,
            &room_name,
            Some(client_id),
        );
        tracing::info!(%room_id, %client_id, "client left");
        self.apply_control(inner, room_id, control).await;
        self.dispose_if_empty(inner, room_id).await;
    }

    async fn forward_to_bound(&self, client_id: &ClientId, payload: &[u8]) {
        let mut inner = self.inner.lock().await;
        let bound = inner
            .bindings
            .get(client_id)
            .cloned()
            .unwrap_or_default();
        for room_id in bound {
            let mut control = RoomControl::default();
            {
                let Some(room) = inner.rooms.get_mut(&room_id) else {
                    continue;
                };
                room.handler.on_message(client_id, payload, &mut control);
            }
            self.apply_control(&mut inner, &room_id, control).await;
        }
    }

    async fn apply_control(
        &self,
        inner: &mut Inner,
        room_id: &RoomId,
        control: RoomControl,
    ) {
        for action in control.actions {
            match action {
                ControlAction::Lock => {
                    self.lock_room_inner(inner, room_id).await;
                }
                ControlAction::Unlock => {
                    self.unlock_room_inner(inner, room_id).await;
                }
                ControlAction::Dispose => {
                    self.dispose(inner, room_id).await;
                    return;
                }
                ControlAction::SetMaxClients(max) => {
                    if let Some(room) = inner.rooms.get_mut(room_id) {
                        room.max_clients = max;
                    }
                }
                ControlAction::SetMetadata(metadata) => {
                    if let Some(room) = inner.rooms.get_mut(room_id) {
                        room.metadata = metadata;
                    }
                }
                ControlAction::SetPrivate(private) => {
                    if let Some(room) = inner.rooms.get_mut(room_id) {
                        room.private = private;
                    }
                }
            }
        }
    }

    async fn lock_room_inner(&self, inner: &mut Inner, room_id: &RoomId) {
        let room_name = {
            let Some(room) = inner.rooms.get_mut(room_id) else {
                return;
            };
            if room.lifecycle != RoomLifecycle::Unlocked {
                return;
            }
            room.lifecycle = RoomLifecycle::Locked;
            room.room_name.clone()
        };

        if let Some(list) = inner.available.get_mut(&room_name) {
            list.retain(|r| r != room_id);
        }
        self.emit(inner, RoomEventKind::Lock, room_id, &room_name, None);
        self.publish_lifecycle(room_id, &room_name, "lock").await;
        tracing::debug!(%room_id, "room locked");
    }

    async fn unlock_room_inner(&self, inner: &mut Inner, room_id: &RoomId) {
        let room_name = {
            let Some(room) = inner.rooms.get_mut(room_id) else {
                return;
            };
            // Unlocking a room that was never locked is a no-op.
            if room.lifecycle != RoomLifecycle::Locked {
                return;
            }
            room.lifecycle = RoomLifecycle::Unlocked;
            room.room_name.clone()
        };

        let list = inner.available.entry(room_name.clone()).or_default();
        if !list.contains(room_id) {
            list.push(room_id.clone());
        }
        self.emit(inner, RoomEventKind::Unlock, room_id, &room_name, None);
        self.publish_lifecycle(room_id, &room_name, "unlock").await;
        tracing::debug!(%room_id, "room unlocked");
    }

    async fn dispose_if_empty(&self, inner: &mut Inner, room_id: &RoomId) {
        let no_clients = inner
            .rooms
            .get(room_id)
            .is_some_and(|room| room.clients.is_empty());
        let no_reservations = inner
            .reservations
            .get(room_id)
            .is_none_or(|seats| seats.is_empty());
        if no_clients && no_reservations {
            self.dispose(inner, room_id).await;
        }
    }

    /// Tears the room out of every index. Emits Dispose exactly once:
    /// the room leaves the id index before any hook runs, so a second
    /// call finds nothing.
    async fn dispose(&self, inner: &mut Inner, room_id: &RoomId) {
        let Some(mut room) = inner.rooms.remove(room_id) else {
            return;
        };
        room.lifecycle = RoomLifecycle::Disposing;

        if let Some(timer) = room.grace_timer.take() {
            timer.abort();
        }
        if let Some(seats) = inner.reservations.remove(room_id) {
            for seat in seats.values() {
                seat.timer.abort();
            }
        }
        if let Some(list) = inner.available.get_mut(&room.room_name) {
            list.retain(|r| r != room_id);
        }
        for client_id in &room.clients {
            let now_empty = inner
                .bindings
                .get_mut(client_id)
                .map(|bound| {
                    bound.retain(|r| r != room_id);
                    bound.is_empty()
                })
                .unwrap_or(false);
            if now_empty {
                inner.bindings.remove(client_id);
            }
        }

        room.handler.on_dispose().await;
        room.lifecycle = RoomLifecycle::Disposed;

        self.emit(
            inner,
            RoomEventKind::Dispose,
            room_id,
            &room.room_name,
            None,
        );
        if let Err(err) = self
            .presence
            .srem(&roomlist_key(&room.room_name), room_id.as_str())
            .await
        {
            tracing::warn!(%room_id, %err, "presence srem failed");
        }
        self.publish_lifecycle(room_id, &room.room_name, "dispose")
            .await;
        tracing::info!(%room_id, room_name = %room.room_name, "room disposed");
    }

    fn generate_room_id(&self, inner: &mut Inner) -> RoomId {
        loop {
            let id = RoomId::generate();
            if inner.issued_ids.insert(id.as_str().to_string()) {
                return id;
            }
        }
    }

    fn emit(
        &self,
        inner: &Inner,
        kind: RoomEventKind,
        room_id: &RoomId,
        room_name: &str,
        client_id: Option<&ClientId>,
    ) {
        if let Some(reg) = inner.handlers.get(room_name) {
            reg.emit(&RoomEvent {
                kind,
                room_id: room_id.clone(),
                room_name: room_name.to_string(),
                client_id: client_id.cloned(),
            });
        }
    }

    async fn publish_lifecycle(
        &self,
        room_id: &RoomId,
        room_name: &str,
        kind: &str,
    ) {
        let payload = serde_json::json!({
            "kind": kind,
            "roomId": room_id.as_str(),
            "roomName": room_name,
            "processId": self.process_id,
        });
        if let Err(err) =
            self.presence.publish(&room_topic(room_id), payload).await
        {
            tracing::warn!(%room_id, %err, "lifecycle publish failed");
        }
    }
}
