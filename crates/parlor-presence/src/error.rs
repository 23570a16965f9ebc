//! Error types for the presence layer.

/// Errors that can occur in a presence implementation.
///
/// [`crate::LocalPresence`] never fails; the variants here exist for
/// implementations that cross a transport.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// The underlying pub/sub medium is gone.
    #[error("presence bus closed")]
    BusClosed,
}
