//! Error types for the matchmaking layer.

use parlor_presence::PresenceError;
use parlor_protocol::{ClientId, RoomId};

/// Errors that can occur during matchmaking and room lifecycle
/// operations.
///
/// Request-scoped failures (a join that resolves no room, a seat
/// consumed too late) surface as these variants; locally recoverable
/// conditions (one candidate room rejecting admission, a malformed
/// frame) are absorbed inside the operation and never reach here.
#[derive(Debug, thiserror::Error)]
pub enum MatchMakeError {
    /// The identifier is not a room id, not a registered room name,
    /// and auto-create was disallowed.
    #[error("invalid room id \"{0}\"")]
    InvalidRoomId(String),

    /// An id-based lookup missed.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// No candidate room matched and creation was disallowed.
    #[error("join request for \"{0}\" failed: no eligible room")]
    JoinRequestFailed(String),

    /// The init hook or the initial admission check failed during
    /// room creation.
    #[error("failed to create room \"{0}\": {1}")]
    RoomCreationFailed(String, String),

    /// An existing room refused the join options.
    #[error("room {0} rejected the join request")]
    AdmissionRejected(RoomId),

    /// The client tried to consume a seat after its reservation
    /// expired, or without ever holding one.
    #[error("no live seat reservation for client {1} in room {0}")]
    ReservationExpired(RoomId, ClientId),

    /// A room type name was registered twice.
    #[error("handler \"{0}\" already registered")]
    HandlerExists(String),

    /// A room type name was never registered.
    #[error("no handler registered for \"{0}\"")]
    HandlerNotFound(String),

    /// A cross-process call did not complete within its deadline.
    #[error("remote call on \"{0}\" timed out")]
    IpcTimeout(String),

    /// A cross-process call returned the error outcome.
    #[error("remote call on \"{0}\" failed: {1}")]
    IpcError(String, String),

    /// The presence medium failed.
    #[error(transparent)]
    Presence(#[from] PresenceError),
}
