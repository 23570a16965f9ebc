//! Wire message definitions and the encode half of the codec.
//!
//! Every frame starts with a 1-byte type tag. Tags 1–29 are control
//! messages with fixed binary layouts, 50–60 are generic/error
//! messages, and tags ≥ 100 are opaque application payloads carried as
//! msgpack values. Strings are UTF-8 with a 1-byte prefix storing the
//! byte length **plus one** (so a prefix of zero is always malformed),
//! with no padding between fields.

use crate::codec::put_str;
use crate::{ClientId, ProtocolError, RoomSummary};

/// Message type tags, one constant per frame kind.
pub mod tag {
    /// Client identity assignment (server → client).
    pub const USER_ID: u8 = 1;
    /// Join request (client → server).
    pub const JOIN_REQUEST: u8 = 9;
    /// Join confirmation with session + serializer ids.
    pub const JOIN_ROOM: u8 = 10;
    /// Join failure with a human-readable reason.
    pub const JOIN_ERROR: u8 = 11;
    /// Leave every room the client occupies.
    pub const LEAVE_ROOM: u8 = 12;
    /// Room-scoped opaque data frame.
    pub const ROOM_DATA: u8 = 13;
    /// Full room state frame.
    pub const ROOM_STATE: u8 = 14;
    /// Room state delta frame.
    pub const ROOM_STATE_PATCH: u8 = 15;
    /// Room listing response.
    pub const ROOM_LIST: u8 = 20;
    /// Generic error.
    pub const BAD_REQUEST: u8 = 50;
    /// First tag available for opaque application payloads.
    pub const APPLICATION_BASE: u8 = 100;
}

/// A decoded wire message.
///
/// The ROOM_DATA / ROOM_STATE / ROOM_STATE_PATCH variants carry their
/// opaque payload bytes verbatim after the tag byte; an empty payload
/// models the two-frame form where the payload travels separately.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Tag 1: assigns the client its id.
    UserId { client_id: ClientId },

    /// Tag 9: client asks to join `room` (a room id or a room name).
    JoinRequest {
        request_id: u8,
        room: String,
        process_id: String,
    },

    /// Tag 10: join succeeded.
    JoinRoom {
        session_id: String,
        serializer_id: String,
        /// Serializer handshake bytes; empty when the serializer has
        /// no handshake.
        handshake: Vec<u8>,
    },

    /// Tag 11: join failed.
    JoinError { message: String },

    /// Tag 12: leave; no payload.
    LeaveRoom,

    /// Tag 13: opaque room data.
    RoomData { payload: Vec<u8> },

    /// Tag 14: full state snapshot.
    RoomState { payload: Vec<u8> },

    /// Tag 15: state delta.
    RoomStatePatch { payload: Vec<u8> },

    /// Tag 20: room listing, msgpack-encoded `[request_id, rooms]`.
    RoomList {
        request_id: u8,
        rooms: Vec<RoomSummary>,
    },

    /// Tag 50: generic error; no payload.
    BadRequest,

    /// Tags ≥ 100: opaque application payload, msgpack-encoded.
    Application { tag: u8, value: rmpv::Value },
}

impl Message {
    /// Returns the wire tag for this message.
    pub fn tag(&self) -> u8 {
        match self {
            Message::UserId { .. } => tag::USER_ID,
            Message::JoinRequest { .. } => tag::JOIN_REQUEST,
            Message::JoinRoom { .. } => tag::JOIN_ROOM,
            Message::JoinError { .. } => tag::JOIN_ERROR,
            Message::LeaveRoom => tag::LEAVE_ROOM,
            Message::RoomData { .. } => tag::ROOM_DATA,
            Message::RoomState { .. } => tag::ROOM_STATE,
            Message::RoomStatePatch { .. } => tag::ROOM_STATE_PATCH,
            Message::RoomList { .. } => tag::ROOM_LIST,
            Message::BadRequest => tag::BAD_REQUEST,
            Message::Application { tag, .. } => *tag,
        }
    }

    /// Encodes the message into its byte-exact wire form.
    ///
    /// # Errors
    /// Fails if a string field exceeds the 254-byte prefix limit, if
    /// an application tag falls in a reserved range, or if an opaque
    /// value cannot be written.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut buf = Vec::with_capacity(16);
        buf.push(self.tag());

        match self {
            Message::UserId { client_id } => {
                put_str(&mut buf, client_id.as_str())?;
            }
            Message::JoinRequest {
                request_id,
                room,
                process_id,
            } => {
                buf.push(*request_id);
                put_str(&mut buf, room)?;
                put_str(&mut buf, process_id)?;
            }
            Message::JoinRoom {
                session_id,
                serializer_id,
                handshake,
            } => {
                put_str(&mut buf, session_id)?;
                put_str(&mut buf, serializer_id)?;
                buf.extend_from_slice(handshake);
            }
            Message::JoinError { message } => {
                put_str(&mut buf, message)?;
            }
            Message::LeaveRoom | Message::BadRequest => {}
            Message::RoomData { payload }
            | Message::RoomState { payload }
            | Message::RoomStatePatch { payload } => {
                buf.extend_from_slice(payload);
            }
            Message::RoomList { request_id, rooms } => {
                let value = rmpv::ext::to_value((*request_id, rooms))?;
                rmpv::encode::write_value(&mut buf, &value)?;
            }
            Message::Application { tag, value } => {
                if *tag < tag::APPLICATION_BASE {
                    return Err(ProtocolError::ReservedTag(*tag));
                }
                rmpv::encode::write_value(&mut buf, value)?;
            }
        }

        Ok(buf)
    }
}
