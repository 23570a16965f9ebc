//! The client-side contract the core needs from a transport.
//!
//! The actual socket layer lives outside this crate. The matchmaker
//! only requires that it can push encoded frames at a connected client
//! on a best-effort basis: sends against a closed connection are
//! silent no-ops, never errors.

use std::sync::Arc;

use parlor_protocol::{ClientId, Message};

/// What the core needs from one client connection.
pub trait ClientTransport: Send + Sync {
    /// Pushes raw bytes at the client. Implementations must drop the
    /// frame silently when the connection is not open.
    fn send(&self, data: &[u8]);

    /// Returns `true` while the connection can accept sends.
    fn is_open(&self) -> bool;

    /// Closes the connection.
    fn close(&self);
}

/// A connected client as seen by the matchmaker.
#[derive(Clone)]
pub struct Client {
    /// The client's unique id (assigned at the transport handshake).
    pub id: ClientId,
    transport: Arc<dyn ClientTransport>,
}

impl Client {
    /// Wraps a transport connection with its client id.
    pub fn new(id: ClientId, transport: Arc<dyn ClientTransport>) -> Self {
        Self { id, transport }
    }

    /// Encodes and sends a message, best-effort.
    ///
    /// Nothing is sent when the connection is closed or the message
    /// fails to encode; either case is logged and dropped.
    pub fn send_message(&self, message: &Message) {
        if !self.transport.is_open() {
            return;
        }
        match message.encode() {
            Ok(bytes) => self.transport.send(&bytes),
            Err(err) => {
                tracing::warn!(client_id = %self.id, %err, "frame encode failed");
            }
        }
    }

    /// Closes the underlying connection.
    pub fn close(&self) {
        self.transport.close();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("id", &self.id).finish()
    }
}

/// An in-memory transport that records every sent frame.
///
/// Used by this crate's tests and useful for downstream ones, so it
/// ships in the library proper.
#[derive(Default)]
pub struct MockTransport {
    sent: std::sync::Mutex<Vec<Vec<u8>>>,
    closed: std::sync::atomic::AtomicBool,
}

impl MockTransport {
    /// Creates an open mock connection.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns every frame sent so far.
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Decodes the most recently sent frame, if any.
    pub fn last_message(&self) -> Option<Message> {
        let frames = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        frames.last().and_then(|bytes| parlor_protocol::decode(bytes))
    }
}

impl ClientTransport for MockTransport {
    fn send(&self, data: &[u8]) {
        if self.is_open() {
            self.sent
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(data.to_vec());
        }
    }

    fn is_open(&self) -> bool {
        !self.closed.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn close(&self) {
        self.closed
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_records_encoded_frame() {
        let transport = MockTransport::new();
        let client = Client::new(ClientId::from("c1"), transport.clone());

        client.send_message(&Message::LeaveRoom);
        assert_eq!(transport.sent_frames().len(), 1);
        assert_eq!(transport.last_message(), Some(Message::LeaveRoom));
    }

    #[test]
    fn test_send_after_close_is_a_no_op() {
        let transport = MockTransport::new();
        let client = Client::new(ClientId::from("c1"), transport.clone());

        client.close();
        client.send_message(&Message::BadRequest);
        assert!(transport.sent_frames().is_empty());
    }
}
