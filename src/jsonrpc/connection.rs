//! Connection: bidirectional pairing of the framing codec and the dispatcher
//! with a transport.
//!
//! A `Connection` owns the outbound queue, the streaming decoder, and a
//! reference to the dispatcher's pending-request table. It is the thing an
//! application actually holds: register handlers on it, call `request`/
//! `notify`, and either drive it manually with `receive`/`next_outgoing` or
//! hand it a transport and let `serve` spawn the reader/writer tasks.

use crate::jsonrpc::codec::{encode, Decoder, Frame};
use crate::jsonrpc::dispatcher::{Dispatcher, HandlerError};
use crate::jsonrpc::error::JsonRpcError;
use crate::jsonrpc::message::Message;
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, trace, warn};

/// Default bound on the outbound queue. A slow writer naturally applies
/// backpressure to handlers emitting responses once this fills.
const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum State {
    Idle = 0,
    Active = 1,
    Closed = 2,
}

/// A live JSON-RPC connection over some [`Transport`].
///
/// `Idle` until the first `send`/`receive`, then `Active`, then terminally
/// `Closed` on explicit `close()`, transport EOF, or an unrecoverable framing
/// error. Every method fails fast with [`JsonRpcError::ConnectionClosed`]
/// once closed.
pub struct Connection<T: Transport> {
    transport: Arc<T>,
    dispatcher: Arc<Dispatcher>,
    decoder: Mutex<Decoder>,
    outbound_tx: Mutex<Option<mpsc::Sender<Message>>>,
    outbound_rx: Mutex<Option<mpsc::Receiver<Message>>>,
    state: AtomicU8,
}

impl<T: Transport + 'static> Connection<T> {
    pub fn new(transport: T) -> Self {
        Self::with_capacity(transport, DEFAULT_OUTBOUND_CAPACITY)
    }

    pub fn with_capacity(transport: T, outbound_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(outbound_capacity);
        Self {
            transport: Arc::new(transport),
            dispatcher: Arc::new(Dispatcher::new()),
            decoder: Mutex::new(Decoder::new()),
            outbound_tx: Mutex::new(Some(tx)),
            outbound_rx: Mutex::new(Some(rx)),
            state: AtomicU8::new(State::Idle as u8),
        }
    }

    /// The dispatcher backing this connection, for direct access to the
    /// lower-level handler registration API.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::SeqCst) == State::Closed as u8
    }

    fn mark_active(&self) {
        let _ = self.state.compare_exchange(
            State::Idle as u8,
            State::Active as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    fn check_open(&self) -> Result<(), JsonRpcError> {
        if self.is_closed() {
            Err(JsonRpcError::ConnectionClosed)
        } else {
            Ok(())
        }
    }

    /// Register (or replace) the handler for inbound requests of `method`.
    pub async fn on_request<F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.dispatcher.on_request(method, handler).await;
    }

    /// Register (or replace) the handler for inbound notifications of `method`.
    pub async fn on_notification<F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.dispatcher.on_notification(method, handler).await;
    }

    /// Typed convenience over `on_request`.
    pub async fn on_typed_request<P, R, F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        self.dispatcher.on_typed_request(method, handler).await;
    }

    /// Typed convenience over `on_notification`.
    pub async fn on_typed_notification<P, F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.dispatcher.on_typed_notification(method, handler).await;
    }

    /// Send a Request and await its matching Response, without a timeout.
    /// Callers that want cooperative cancellation should use `request`
    /// instead and manage their own `tokio::select!` / task abort.
    pub async fn request_blocking(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
    ) -> Result<Value, JsonRpcError> {
        self.check_open()?;
        self.mark_active();

        let (id, rx) = self.dispatcher.register_next_pending().await;
        self.enqueue(Message::request(id.clone(), method, params))
            .await?;

        match rx.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(error)) => Err(error.into()),
            Err(_) => Err(JsonRpcError::ConnectionClosed),
        }
    }

    /// Send a Request and await its matching Response, racing against
    /// `timeout`. On timeout the pending slot is cancelled and
    /// [`JsonRpcError::Timeout`] is returned — on the wire this is the local
    /// analogue of a `REQUEST_CANCELLED` response.
    pub async fn request(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value, JsonRpcError> {
        self.check_open()?;
        self.mark_active();

        let (id, rx) = self.dispatcher.register_next_pending().await;
        self.enqueue(Message::request(id.clone(), method, params))
            .await?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(error))) => Err(error.into()),
            Ok(Err(_)) => Err(JsonRpcError::ConnectionClosed),
            Err(_) => {
                self.dispatcher.cancel_pending(&id).await;
                Err(JsonRpcError::Timeout)
            }
        }
    }

    /// Typed convenience over `request`: encodes `params`, decodes the
    /// result as `R`.
    pub async fn request_typed<P, R>(
        &self,
        method: impl Into<String>,
        params: &P,
        timeout: Duration,
    ) -> Result<R, JsonRpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)?;
        let result = self.request(method, Some(params), timeout).await?;
        serde_json::from_value(result).map_err(JsonRpcError::ResultDecode)
    }

    /// Enqueue a fire-and-forget Notification.
    pub async fn notify(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
    ) -> Result<(), JsonRpcError> {
        self.check_open()?;
        self.mark_active();
        self.enqueue(Message::notification(method, params)).await
    }

    async fn enqueue(&self, message: Message) -> Result<(), JsonRpcError> {
        let guard = self.outbound_tx.lock().await;
        match guard.as_ref() {
            Some(tx) => tx
                .send(message)
                .await
                .map_err(|_| JsonRpcError::ConnectionClosed),
            None => Err(JsonRpcError::ConnectionClosed),
        }
    }

    /// Feed freshly-arrived bytes to the decoder and dispatch every complete
    /// frame extracted from them.
    ///
    /// A genuine framing error (bad `Content-Length`, truncated UTF-8) is
    /// unrecoverable: the connection is closed and the error returned so the
    /// caller can close its transport. A frame that decoded fine as far as
    /// `Content-Length` accounting goes but failed JSON parsing or message
    /// classification is a protocol error instead — it produces a Response
    /// carrying that error on the outbound queue, and the connection stays
    /// open for the frames after it.
    pub async fn receive(&self, bytes: &[u8]) -> Result<(), JsonRpcError> {
        self.check_open()?;
        self.mark_active();

        let frames = {
            let mut decoder = self.decoder.lock().await;
            match decoder.feed(bytes) {
                Ok(frames) => frames,
                Err(err) => {
                    error!("unrecoverable framing error, closing connection: {err}");
                    self.close().await;
                    return Err(JsonRpcError::Framing(err));
                }
            }
        };

        for frame in frames {
            match frame {
                Frame::Message(message) => {
                    trace!("dispatching inbound message");
                    if let Some(response) = self.dispatcher.dispatch(message).await {
                        self.enqueue(response).await?;
                    }
                }
                Frame::Invalid(error) => {
                    warn!("rejecting malformed message: {}", error.message);
                    self.enqueue(Message::failure(None, error)).await?;
                }
            }
        }
        Ok(())
    }

    /// Pull the next outbound message and encode it as a framed byte
    /// payload. Returns `None` once the outbound queue is closed (after
    /// `close()`), signalling end of stream to a writer loop.
    pub async fn next_outgoing(&self) -> Option<Vec<u8>> {
        let message = {
            let mut guard = self.outbound_rx.lock().await;
            guard.as_mut()?.recv().await?
        };
        Some(encode(&message))
    }

    /// Close the connection: close the outbound queue, cancel every pending
    /// outbound request, and mark the connection terminally closed. Safe to
    /// call more than once.
    pub async fn close(&self) {
        self.state.store(State::Closed as u8, Ordering::SeqCst);
        self.outbound_tx.lock().await.take();
        self.dispatcher.cancel_all().await;
        let _ = self.transport.close().await;
    }

    /// Spawn a reader task (transport -> `receive`) and a writer task
    /// (`next_outgoing` -> transport) that run until the transport
    /// disconnects or the connection is closed. Returns once both tasks
    /// have exited.
    pub async fn serve(self: Arc<Self>) {
        let reader = {
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                loop {
                    if this.is_closed() {
                        break;
                    }
                    match this.transport.receive().await {
                        Ok(bytes) => {
                            if let Err(err) = this.receive(&bytes).await {
                                warn!("connection receive failed: {err}");
                                break;
                            }
                        }
                        Err(err) => {
                            info!("transport closed: {err}");
                            break;
                        }
                    }
                }
                this.close().await;
            })
        };

        let writer = {
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                while let Some(bytes) = this.next_outgoing().await {
                    if let Err(err) = this.transport.send(&bytes).await {
                        warn!("transport send failed: {err}");
                        break;
                    }
                }
            })
        };

        let _ = tokio::join!(reader, writer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonrpc::message::RequestId;
    use crate::transport::MockTransport;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn request_round_trips_through_a_mock_transport() {
        let connection = Arc::new(Connection::new(MockTransport::new()));
        let connection_clone = Arc::clone(&connection);

        let call = tokio::spawn(async move {
            connection_clone
                .request("ping", None, Duration::from_secs(1))
                .await
        });

        // Wait for the request to hit the outbound queue, then read the id
        // back out to build a matching response.
        let framed = connection.next_outgoing().await.unwrap();
        let text = String::from_utf8(framed.clone()).unwrap();
        let body = text.split_once("\r\n\r\n").unwrap().1;
        let sent: Value = serde_json::from_str(body).unwrap();
        let id = sent["id"].as_i64().unwrap();

        let response = Message::success(RequestId::Number(id), json!("pong"));
        connection.receive(&encode(&response)).await.unwrap();

        assert_eq!(call.await.unwrap().unwrap(), json!("pong"));
    }

    #[tokio::test]
    async fn ids_are_strictly_monotonic() {
        let connection = Connection::new(MockTransport::new());
        let (id1, _) = connection.dispatcher().register_next_pending().await;
        let (id2, _) = connection.dispatcher().register_next_pending().await;
        assert_eq!(id1, RequestId::Number(1));
        assert_eq!(id2, RequestId::Number(2));
    }

    #[tokio::test]
    async fn timeout_cancels_pending_and_returns_timeout_error() {
        let connection = Connection::new(MockTransport::new());
        let result = connection
            .request("slow", None, Duration::from_millis(10))
            .await;
        assert!(matches!(result, Err(JsonRpcError::Timeout)));
    }

    #[tokio::test]
    async fn closed_connection_rejects_further_calls() {
        let connection = Connection::new(MockTransport::new());
        connection.close().await;
        let result = connection.notify("x", None).await;
        assert!(matches!(result, Err(JsonRpcError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn notification_is_framed_onto_the_outbound_queue() {
        let connection = Connection::new(MockTransport::new());
        connection
            .notify("textDocument/didOpen", Some(json!({"uri": "file:///a"})))
            .await
            .unwrap();

        let framed = connection.next_outgoing().await.unwrap();
        let text = String::from_utf8(framed).unwrap();
        assert!(text.contains("textDocument/didOpen"));
    }

    #[tokio::test]
    async fn inbound_request_without_handler_yields_method_not_found_on_outbound_queue() {
        let connection = Connection::new(MockTransport::new());
        let request = Message::request(RequestId::Number(1), "nope", None);
        connection.receive(&encode(&request)).await.unwrap();

        let framed = connection.next_outgoing().await.unwrap();
        let text = String::from_utf8(framed).unwrap();
        assert!(text.contains("-32601"));
    }

    #[tokio::test]
    async fn malformed_message_yields_an_error_response_and_leaves_the_connection_open() {
        let connection = Connection::new(MockTransport::new());
        let body = br#"{"jsonrpc":"1.0","method":"x"}"#;
        let mut bytes = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
        bytes.extend_from_slice(body);

        connection.receive(&bytes).await.unwrap();
        assert!(!connection.is_closed());

        let framed = connection.next_outgoing().await.unwrap();
        let text = String::from_utf8(framed).unwrap();
        assert!(text.contains("-32600"));

        // The connection is still open for the next frame.
        let notification = Message::notification("textDocument/didOpen", None);
        connection.receive(&encode(&notification)).await.unwrap();
        assert!(!connection.is_closed());
    }
}
