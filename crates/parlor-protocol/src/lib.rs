//! Wire protocol for Parlor.
//!
//! This crate defines the byte-exact frame format spoken between
//! clients and the matchmaking server:
//!
//! - **Types** ([`ClientId`], [`RoomId`], [`RoomSummary`]): the
//!   identities and listing record that travel on the wire.
//! - **Messages** ([`Message`], [`tag`]): one variant per frame kind,
//!   with a 1-byte tag and fixed field layouts.
//! - **Codec** ([`decode`], [`Message::encode`]): pure functions over
//!   byte slices; decoding malformed input yields `None`, never a
//!   panic or an error to absorb.
//! - **IPC** ([`IpcOutcome`]): the three-way outcome code used to
//!   resolve cross-process matchmaking calls.
//!
//! The protocol layer is stateless: it knows nothing about rooms,
//! reservations, or connections.

mod codec;
mod error;
mod ipc;
mod message;
mod types;

pub use codec::decode;
pub use error::ProtocolError;
pub use ipc::IpcOutcome;
pub use message::{Message, tag};
pub use types::{ClientId, ROOM_ID_LENGTH, RoomId, RoomSummary};
