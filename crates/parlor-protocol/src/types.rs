//! Identity types and the room listing record.
//!
//! Both id types are newtype wrappers over `String`. Client ids come
//! from the transport handshake and are opaque to this crate; room ids
//! are generated server-side with a fixed length and charset so that
//! "is this a room id or a room name?" can be answered syntactically.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of every generated room id, in bytes.
pub const ROOM_ID_LENGTH: usize = 9;

/// Charset used for generated room ids.
const ROOM_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A unique identifier for a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A unique identifier for a room (one game session instance).
///
/// Generated ids are exactly [`ROOM_ID_LENGTH`] alphanumeric bytes,
/// which lets [`RoomId::is_valid`] distinguish ids from room names
/// (names like `"battle_arena"` fail the syntax check).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Generates a fresh random room id.
    ///
    /// Uniqueness over a process lifetime is the caller's concern:
    /// the matchmaker's id generator rejects collisions against every
    /// id it has ever issued.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..ROOM_ID_LENGTH)
            .map(|_| {
                let i = rng.random_range(0..ROOM_ID_ALPHABET.len());
                ROOM_ID_ALPHABET[i] as char
            })
            .collect();
        Self(id)
    }

    /// Returns `true` if `s` is syntactically a room id: exactly
    /// [`ROOM_ID_LENGTH`] ASCII alphanumeric bytes.
    pub fn is_valid(s: &str) -> bool {
        s.len() == ROOM_ID_LENGTH
            && s.bytes().all(|b| b.is_ascii_alphanumeric())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A summary of one room as it appears in room listings.
///
/// This is the record shape shared with the listing driver and with
/// the ROOM_LIST wire frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Number of clients currently bound to the room.
    pub clients: u32,
    /// Whether the room is locked (not accepting joins).
    pub locked: bool,
    /// Whether the room is hidden from public listings.
    pub private: bool,
    /// Maximum clients allowed.
    pub max_clients: u32,
    /// Room-defined metadata, opaque to the core.
    pub metadata: serde_json::Value,
    /// The registered room type name.
    pub name: String,
    /// Identifier of the process hosting the room.
    pub process_id: String,
    /// The room's unique id.
    pub room_id: RoomId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_room_id_is_valid() {
        for _ in 0..50 {
            let id = RoomId::generate();
            assert!(RoomId::is_valid(id.as_str()), "bad id: {id}");
        }
    }

    #[test]
    fn test_room_names_fail_id_syntax() {
        assert!(!RoomId::is_valid("room"));
        assert!(!RoomId::is_valid("dummy_room"));
        assert!(!RoomId::is_valid("fjf10jf10jf0jf0fj"));
        assert!(!RoomId::is_valid(""));
    }

    #[test]
    fn test_nine_char_alphanumeric_passes_id_syntax() {
        assert!(RoomId::is_valid("a1B2c3D4e"));
        assert!(!RoomId::is_valid("a1B2c3D4_"));
    }

    #[test]
    fn test_client_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&ClientId::from("c-1")).unwrap();
        assert_eq!(json, "\"c-1\"");
    }
}
