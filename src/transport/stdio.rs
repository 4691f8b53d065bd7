//! stdio transport — reads/writes the current process's (or a child
//! process's) standard streams.
//!
//! Grounded on the teacher's `io::transport::StdioTransport`: a writer task
//! owns the sink end, a reader task owns the source end, and both talk to
//! the outside world through unbounded channels so `send`/`receive` can be
//! called concurrently from the two tasks a `Connection` spawns.

use super::Transport;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, trace};

const READ_BUFFER_SIZE: usize = 4096;

/// Error type for [`StdioTransport`].
#[derive(Debug, thiserror::Error)]
pub enum StdioTransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport is disconnected")]
    Disconnected,
}

/// Transport backed by any `AsyncRead`/`AsyncWrite` pair — typically
/// `tokio::io::stdin()`/`stdout()`, or a child process's piped stdio.
pub struct StdioTransport {
    outbound_tx: mpsc::UnboundedSender<Vec<u8>>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    connected: AtomicBool,
}

impl StdioTransport {
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::writer_task(writer, outbound_rx));
        tokio::spawn(Self::reader_task(reader, inbound_tx));

        Self {
            outbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            connected: AtomicBool::new(true),
        }
    }

    async fn writer_task<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Vec<u8>>)
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(bytes) = rx.recv().await {
            if let Err(e) = writer.write_all(&bytes).await {
                error!("StdioTransport: write failed: {e}");
                break;
            }
            if let Err(e) = writer.flush().await {
                error!("StdioTransport: flush failed: {e}");
                break;
            }
        }
        trace!("StdioTransport: writer task finished");
    }

    async fn reader_task<R>(mut reader: R, tx: mpsc::UnboundedSender<Vec<u8>>)
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    trace!("StdioTransport: reader reached EOF");
                    break;
                }
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        trace!("StdioTransport: receiver dropped, stopping reader");
                        break;
                    }
                }
                Err(e) => {
                    error!("StdioTransport: read failed: {e}");
                    break;
                }
            }
        }
        trace!("StdioTransport: reader task finished");
    }
}

#[async_trait]
impl Transport for StdioTransport {
    type Error = StdioTransportError;

    async fn send(&self, bytes: &[u8]) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(StdioTransportError::Disconnected);
        }
        self.outbound_tx
            .send(bytes.to_vec())
            .map_err(|_| StdioTransportError::Disconnected)
    }

    async fn receive(&self) -> Result<Vec<u8>, Self::Error> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or(StdioTransportError::Disconnected)
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

    #[tokio::test]
    async fn echoes_bytes_written_to_the_reader_side() {
        let (transport_reader, mut peer_writer) = tokio::io::duplex(1024);
        let (_unused_reader, transport_writer) = tokio::io::duplex(1024);
        let transport = StdioTransport::new(transport_reader, transport_writer);

        peer_writer.write_all(b"hello").await.unwrap();
        peer_writer.flush().await.unwrap();

        let received = transport.receive().await.unwrap();
        assert_eq!(received, b"hello");
    }

    #[tokio::test]
    async fn send_forwards_bytes_to_the_writer_side() {
        let (transport_reader, _unused_writer) = tokio::io::duplex(1024);
        let (mut peer_reader, transport_writer) = tokio::io::duplex(1024);
        let transport = StdioTransport::new(transport_reader, transport_writer);

        transport.send(b"ping").await.unwrap();

        let mut buf = [0u8; 4];
        peer_reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
    }
}
