//! Transport layer — the byte-stream interface `Connection` drives.
//!
//! A transport knows nothing about JSON-RPC, framing, or LSP; it only
//! produces and accepts raw byte chunks at arbitrary boundaries. Methods
//! take `&self` rather than `&mut self` so a `Connection` can run a reader
//! task and a writer task against the same transport concurrently, as the
//! concurrency model requires — concrete implementations push the actual
//! exclusivity down into per-direction background tasks (see
//! [`stdio::StdioTransport`]).

pub mod mock;
pub mod stdio;
pub mod tcp;

use async_trait::async_trait;

/// Core transport trait for bidirectional byte exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send one chunk of bytes (already framed by the caller).
    async fn send(&self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Receive the next available chunk of bytes (arbitrary boundaries —
    /// callers must not assume this aligns with a single frame).
    async fn receive(&self) -> Result<Vec<u8>, Self::Error>;

    /// Close the transport. Idempotent.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Whether the transport is still expected to make progress.
    fn is_connected(&self) -> bool;
}

pub use mock::MockTransport;
pub use stdio::StdioTransport;
pub use tcp::TcpTransport;
