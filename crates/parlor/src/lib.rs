//! Matchmaking and room-lifecycle core for real-time session servers.
//!
//! The [`MatchMaker`] owns every live room in the process: it resolves
//! join requests to rooms through scored selection, holds seats under
//! expiry timers while clients connect, and tears rooms down when the
//! last occupant and reservation are gone. Room behavior is supplied
//! through [`RoomHandler`] implementations registered per room type.
//!
//! Cross-process coordination goes through the
//! [`Presence`](parlor_presence::Presence) abstraction; [`remote_call`]
//! and [`respond_to`] layer request/reply semantics on top of it.

mod client;
mod driver;
mod error;
mod handler;
mod ipc;
mod matchmaker;
mod room;

pub use client::{Client, ClientTransport, MockTransport};
pub use driver::{
    LocalDriver, MatchMakerDriver, QueryConditions, RoomListing,
};
pub use error::MatchMakeError;
pub use handler::{
    ClientOptions, DEFAULT_SEAT_RESERVATION_TIME, EventListener,
    HandlerFactory, RoomEvent, RoomEventKind, RoomHandler,
};
pub use ipc::{remote_call, respond_to};
pub use matchmaker::MatchMaker;
pub use room::{RoomControl, RoomLifecycle, UNBOUNDED_CLIENTS};
