//! TCP socket transport — the connection's second concrete factory.
//!
//! Same reader/writer-task shape as [`super::stdio::StdioTransport`], split
//! across `OwnedReadHalf`/`OwnedWriteHalf` instead of two independent
//! streams.

use super::Transport;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, trace};

const READ_BUFFER_SIZE: usize = 4096;

/// Error type for [`TcpTransport`].
#[derive(Debug, thiserror::Error)]
pub enum TcpTransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport is disconnected")]
    Disconnected,
}

/// Transport backed by a single TCP connection — one socket, one peer, per
/// the one-transport-one-peer restriction (no multiplexing).
pub struct TcpTransport {
    outbound_tx: mpsc::UnboundedSender<Vec<u8>>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    connected: AtomicBool,
    peer_addr: Option<SocketAddr>,
}

impl TcpTransport {
    /// Connect to `addr` and wrap the resulting socket.
    pub async fn connect(addr: SocketAddr) -> Result<Self, TcpTransportError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already-accepted or already-connected socket.
    pub fn from_stream(stream: TcpStream) -> Self {
        let peer_addr = stream.peer_addr().ok();
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::writer_task(write_half, outbound_rx));
        tokio::spawn(Self::reader_task(read_half, inbound_tx));

        Self {
            outbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            connected: AtomicBool::new(true),
            peer_addr,
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    async fn writer_task(mut writer: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
        while let Some(bytes) = rx.recv().await {
            if let Err(e) = writer.write_all(&bytes).await {
                error!("TcpTransport: write failed: {e}");
                break;
            }
            if let Err(e) = writer.flush().await {
                error!("TcpTransport: flush failed: {e}");
                break;
            }
        }
        trace!("TcpTransport: writer task finished");
    }

    async fn reader_task(mut reader: OwnedReadHalf, tx: mpsc::UnboundedSender<Vec<u8>>) {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    trace!("TcpTransport: peer closed the connection");
                    break;
                }
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("TcpTransport: read failed: {e}");
                    break;
                }
            }
        }
        trace!("TcpTransport: reader task finished");
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Error = TcpTransportError;

    async fn send(&self, bytes: &[u8]) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(TcpTransportError::Disconnected);
        }
        self.outbound_tx
            .send(bytes.to_vec())
            .map_err(|_| TcpTransportError::Disconnected)
    }

    async fn receive(&self) -> Result<Vec<u8>, Self::Error> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or(TcpTransportError::Disconnected)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn round_trips_bytes_over_a_real_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            TcpTransport::from_stream(socket)
        });

        let client = TcpTransport::connect(addr).await.unwrap();
        let server = server.await.unwrap();

        client.send(b"hello").await.unwrap();
        let received = server.receive().await.unwrap();
        assert_eq!(received, b"hello");

        server.send(b"world").await.unwrap();
        let received = client.receive().await.unwrap();
        assert_eq!(received, b"world");
    }
}
