//! In-memory transport for deterministic connection tests.
//!
//! Grounded on the teacher's `io::transport::MockTransport`: a queue of
//! canned inbound responses and a record of everything sent.

use super::Transport;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify};

#[derive(Debug, thiserror::Error)]
pub enum MockTransportError {
    #[error("transport is disconnected")]
    Disconnected,
}

/// Transport that records what was sent and replays a queue of inbound
/// byte chunks pushed in by the test, either up front via
/// `with_responses` or incrementally via `push_inbound`.
pub struct MockTransport {
    sent: Mutex<Vec<Vec<u8>>>,
    inbound: Mutex<VecDeque<Vec<u8>>>,
    inbound_available: Notify,
    connected: AtomicBool,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            inbound: Mutex::new(VecDeque::new()),
            inbound_available: Notify::new(),
            connected: AtomicBool::new(true),
        }
    }

    pub fn with_responses(responses: Vec<Vec<u8>>) -> Self {
        let transport = Self::new();
        {
            let mut inbound = transport.inbound.try_lock().expect("fresh mutex");
            inbound.extend(responses);
        }
        transport
    }

    pub async fn push_inbound(&self, bytes: Vec<u8>) {
        self.inbound.lock().await.push_back(bytes);
        self.inbound_available.notify_one();
    }

    pub async fn sent_messages(&self) -> Vec<Vec<u8>> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Error = MockTransportError;

    async fn send(&self, bytes: &[u8]) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(MockTransportError::Disconnected);
        }
        self.sent.lock().await.push(bytes.to_vec());
        Ok(())
    }

    /// Waits for either a queued inbound chunk or disconnection — never
    /// returns spuriously empty-handed, so a `Connection::serve` reader
    /// loop can drive a `MockTransport` the same way it drives a real one.
    async fn receive(&self) -> Result<Vec<u8>, Self::Error> {
        loop {
            // Register interest before checking state, so a notification
            // racing with this check is never missed.
            let notified = self.inbound_available.notified();

            if let Some(bytes) = self.inbound.lock().await.pop_front() {
                return Ok(bytes);
            }
            if !self.is_connected() {
                return Err(MockTransportError::Disconnected);
            }
            notified.await;
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.connected.store(false, Ordering::SeqCst);
        self.inbound_available.notify_waiters();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receive_waits_for_a_pushed_chunk() {
        let transport = std::sync::Arc::new(MockTransport::new());
        let reader = tokio::spawn({
            let transport = std::sync::Arc::clone(&transport);
            async move { transport.receive().await }
        });

        tokio::task::yield_now().await;
        transport.push_inbound(b"hello".to_vec()).await;

        assert_eq!(reader.await.unwrap().unwrap(), b"hello");
    }

    #[tokio::test]
    async fn receive_fails_once_closed_with_nothing_queued() {
        let transport = MockTransport::new();
        transport.close().await.unwrap();
        assert!(matches!(
            transport.receive().await,
            Err(MockTransportError::Disconnected)
        ));
    }
}
