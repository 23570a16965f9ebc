//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
///
/// Decode errors never escape [`crate::decode`]; malformed client
/// input is logged and dropped there. The fallible variants exist for
/// [`crate::Message::try_decode`] and for encoding, where the caller
/// controls the input and a failure is a real bug.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The buffer ended before the current field was complete.
    #[error("buffer ended unexpectedly at byte {0}")]
    UnexpectedEof(usize),

    /// A string length prefix of zero (prefixes store length plus one,
    /// so zero can never occur in well-formed input).
    #[error("string length prefix of zero at byte {0}")]
    ZeroLengthPrefix(usize),

    /// A string field longer than the 254-byte prefix limit.
    #[error("string field of {0} bytes exceeds the 254-byte limit")]
    StringTooLong(usize),

    /// A string field that is not valid UTF-8.
    #[error("invalid utf-8 in string field at byte {0}")]
    InvalidUtf8(usize),

    /// A message tag outside every reserved range.
    #[error("unknown message tag {0}")]
    UnknownTag(u8),

    /// An application message encoded with a tag below 100.
    #[error("tag {0} is reserved for control messages")]
    ReservedTag(u8),

    /// Bytes left over after a fixed-layout message was fully read.
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    /// Writing an opaque msgpack value failed.
    #[error("object encode failed: {0}")]
    ObjectEncode(#[from] rmpv::encode::Error),

    /// Reading an opaque msgpack value failed.
    #[error("object decode failed: {0}")]
    ObjectDecode(#[from] rmpv::decode::Error),

    /// An opaque msgpack value did not match the expected shape.
    #[error("object conversion failed: {0}")]
    ObjectConvert(#[from] rmpv::ext::Error),
}
