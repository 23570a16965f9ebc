//! The decode half of the codec, plus shared byte helpers.
//!
//! Decoding malformed input must never crash the caller: clients send
//! arbitrary bytes. [`decode`] absorbs every failure into a logged
//! `None`; [`Message::try_decode`] exposes the underlying error for
//! tests and diagnostics.

use crate::message::tag;
use crate::{ClientId, Message, ProtocolError};

/// Appends a length-prefixed UTF-8 string (prefix stores length + 1).
pub(crate) fn put_str(
    buf: &mut Vec<u8>,
    s: &str,
) -> Result<(), ProtocolError> {
    let len = s.len();
    if len > u8::MAX as usize - 1 {
        return Err(ProtocolError::StringTooLong(len));
    }
    buf.push(len as u8 + 1);
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

/// A cursor over a received frame.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn u8(&mut self) -> Result<u8, ProtocolError> {
        let b = self
            .buf
            .get(self.pos)
            .copied()
            .ok_or(ProtocolError::UnexpectedEof(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    fn str(&mut self) -> Result<String, ProtocolError> {
        let at = self.pos;
        let prefix = self.u8()?;
        if prefix == 0 {
            return Err(ProtocolError::ZeroLengthPrefix(at));
        }
        let len = prefix as usize - 1;
        let end = self.pos + len;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or(ProtocolError::UnexpectedEof(self.buf.len()))?;
        let s = std::str::from_utf8(bytes)
            .map_err(|_| ProtocolError::InvalidUtf8(self.pos))?
            .to_string();
        self.pos = end;
        Ok(s)
    }

    /// Consumes and returns all remaining bytes.
    fn rest(&mut self) -> Vec<u8> {
        let out = self.buf[self.pos..].to_vec();
        self.pos = self.buf.len();
        out
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fails if any bytes are left unread.
    fn finish(&self) -> Result<(), ProtocolError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(ProtocolError::TrailingBytes(n)),
        }
    }
}

impl Message {
    /// Decodes one frame, surfacing the exact failure.
    pub fn try_decode(buf: &[u8]) -> Result<Message, ProtocolError> {
        let mut r = Reader::new(buf);
        let t = r.u8()?;

        let msg = match t {
            tag::USER_ID => {
                let client_id = ClientId(r.str()?);
                r.finish()?;
                Message::UserId { client_id }
            }
            tag::JOIN_REQUEST => {
                let request_id = r.u8()?;
                let room = r.str()?;
                let process_id = r.str()?;
                r.finish()?;
                Message::JoinRequest {
                    request_id,
                    room,
                    process_id,
                }
            }
            tag::JOIN_ROOM => {
                let session_id = r.str()?;
                let serializer_id = r.str()?;
                let handshake = r.rest();
                Message::JoinRoom {
                    session_id,
                    serializer_id,
                    handshake,
                }
            }
            tag::JOIN_ERROR => {
                let message = r.str()?;
                r.finish()?;
                Message::JoinError { message }
            }
            tag::LEAVE_ROOM => {
                r.finish()?;
                Message::LeaveRoom
            }
            tag::ROOM_DATA => Message::RoomData { payload: r.rest() },
            tag::ROOM_STATE => Message::RoomState { payload: r.rest() },
            tag::ROOM_STATE_PATCH => Message::RoomStatePatch {
                payload: r.rest(),
            },
            tag::ROOM_LIST => {
                let mut body = &buf[1..];
                let value = rmpv::decode::read_value(&mut body)?;
                let (request_id, rooms) = rmpv::ext::from_value(value)?;
                if !body.is_empty() {
                    return Err(ProtocolError::TrailingBytes(body.len()));
                }
                Message::RoomList { request_id, rooms }
            }
            tag::BAD_REQUEST => {
                r.finish()?;
                Message::BadRequest
            }
            t if t >= tag::APPLICATION_BASE => {
                let mut body = &buf[1..];
                let value = rmpv::decode::read_value(&mut body)?;
                if !body.is_empty() {
                    return Err(ProtocolError::TrailingBytes(body.len()));
                }
                Message::Application { tag: t, value }
            }
            t => return Err(ProtocolError::UnknownTag(t)),
        };

        Ok(msg)
    }
}

/// Decodes one frame, treating any failure as "no message".
///
/// Malformed input is logged at `warn` and dropped. Callers must not
/// treat a `None` as an error path: a client sending garbage must
/// never take down the process.
pub fn decode(buf: &[u8]) -> Option<Message> {
    match Message::try_decode(buf) {
        Ok(msg) => Some(msg),
        Err(err) => {
            tracing::warn!(%err, len = buf.len(), "dropping undecodable frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_str_prefix_is_length_plus_one() {
        let mut buf = Vec::new();
        put_str(&mut buf, "abc").unwrap();
        assert_eq!(buf, vec![4, b'a', b'b', b'c']);
    }

    #[test]
    fn test_put_str_empty_string_has_prefix_one() {
        let mut buf = Vec::new();
        put_str(&mut buf, "").unwrap();
        assert_eq!(buf, vec![1]);
    }

    #[test]
    fn test_put_str_rejects_over_254_bytes() {
        let mut buf = Vec::new();
        let long = "x".repeat(255);
        assert!(matches!(
            put_str(&mut buf, &long),
            Err(ProtocolError::StringTooLong(255))
        ));
    }

    #[test]
    fn test_decode_empty_buffer_is_none() {
        assert_eq!(decode(&[]), None);
    }

    #[test]
    fn test_decode_zero_prefix_is_none() {
        // USER_ID with an impossible zero length prefix.
        assert_eq!(decode(&[tag::USER_ID, 0]), None);
    }

    #[test]
    fn test_decode_truncated_string_is_none() {
        // Prefix claims 5 bytes, only 2 present.
        assert_eq!(decode(&[tag::USER_ID, 6, b'a', b'b']), None);
    }

    #[test]
    fn test_decode_unknown_tag_is_none() {
        assert_eq!(decode(&[42]), None);
        assert_eq!(decode(&[99]), None);
    }

    #[test]
    fn test_decode_invalid_utf8_is_none() {
        assert_eq!(decode(&[tag::JOIN_ERROR, 3, 0xff, 0xfe]), None);
    }

    #[test]
    fn test_decode_trailing_bytes_on_fixed_layout_is_none() {
        let mut buf = Message::LeaveRoom.encode().unwrap();
        buf.push(7);
        assert_eq!(decode(&buf), None);
    }
}
