//! Dispatcher: method registry, inbound routing, and outbound correlation.
//!
//! Holds the request-handler map, the notification-handler map, and the
//! pending-request table behind one mutex (guarding the invariant that
//! registration and lookup are called from different tasks — see the
//! concurrency notes). Handlers are always invoked with the mutex released.

use crate::jsonrpc::message::{error_codes, Message, RequestId, ResponseError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// The outcome of a registered handler: either an LSP-typed failure (passed
/// to the peer verbatim) or anything else, which becomes a generic
/// `INTERNAL_ERROR` — the original detail is never serialized to the peer.
#[derive(Debug)]
pub enum HandlerError {
    Typed(ResponseError),
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    fn into_response_error(self) -> ResponseError {
        match self {
            HandlerError::Typed(err) => err,
            HandlerError::Other(err) => {
                debug!("handler failed: {err}");
                ResponseError::internal_error()
            }
        }
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        HandlerError::Other(Box::new(err))
    }
}

/// Trait-object form of a request handler.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, params: Option<Value>) -> Result<Value, HandlerError>;
}

#[async_trait]
impl<F, Fut> RequestHandler for F
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send,
{
    async fn handle(&self, params: Option<Value>) -> Result<Value, HandlerError> {
        (self)(params).await
    }
}

/// Trait-object form of a notification handler. Failures are swallowed —
/// notifications never produce a reply and must not destabilize the
/// dispatcher.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn handle(&self, params: Option<Value>);
}

#[async_trait]
impl<F, Fut> NotificationHandler for F
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn handle(&self, params: Option<Value>) {
        (self)(params).await
    }
}

/// A completion slot for one outbound request, resolved with the raw
/// `result` value or failed with the peer's `ResponseError`.
pub(crate) type PendingSlot = oneshot::Sender<Result<Value, ResponseError>>;

const CANCEL_METHOD: &str = crate::protocol::meta::CANCEL_REQUEST;

struct DispatcherState {
    requests: HashMap<String, Arc<dyn RequestHandler>>,
    notifications: HashMap<String, Arc<dyn NotificationHandler>>,
    pending: HashMap<RequestId, PendingSlot>,
    inbound_cancel: HashMap<RequestId, CancellationToken>,
    /// Next outbound id to hand out. Generation happens under the same lock
    /// as the pending-table insert, so ids are strictly monotonic and each
    /// appears in the table at most once at a time.
    next_id: i64,
}

impl Default for DispatcherState {
    fn default() -> Self {
        Self {
            requests: HashMap::new(),
            notifications: HashMap::new(),
            pending: HashMap::new(),
            inbound_cancel: HashMap::new(),
            next_id: 1,
        }
    }
}

/// Registry of method handlers plus the outbound pending-request table.
pub struct Dispatcher {
    state: Mutex<DispatcherState>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DispatcherState::default()),
        }
    }

    /// Register (or replace) the handler for inbound requests of `method`.
    pub async fn on_request<F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        let mut state = self.state.lock().await;
        state.requests.insert(method.into(), Arc::new(handler));
    }

    /// Register (or replace) the handler for inbound notifications of `method`.
    pub async fn on_notification<F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.state.lock().await;
        state.notifications.insert(method.into(), Arc::new(handler));
    }

    /// Typed convenience over `on_request`: decodes `params` as `P` and
    /// encodes the handler's `R` as the result. A non-nullable `P` that
    /// receives absent/null params fails to deserialize and is reported as
    /// `INVALID_PARAMS`, exactly as the raw handler would have to do by hand.
    pub async fn on_typed_request<P, R, F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.on_request(method, move |params: Option<Value>| {
            let handler = Arc::clone(&handler);
            async move {
                let params: P = serde_json::from_value(params.unwrap_or(Value::Null))
                    .map_err(|err| HandlerError::Typed(ResponseError::invalid_params(err.to_string())))?;
                let result = handler(params).await?;
                serde_json::to_value(result)
                    .map_err(|err| HandlerError::Typed(ResponseError::internal_error_with(err.to_string())))
            }
        })
        .await;
    }

    /// Typed convenience over `on_notification`, same decoding rule as
    /// `on_typed_request`.
    pub async fn on_typed_notification<P, F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.on_notification(method, move |params: Option<Value>| {
            let handler = Arc::clone(&handler);
            async move {
                match serde_json::from_value::<P>(params.unwrap_or(Value::Null)) {
                    Ok(params) => handler(params).await,
                    Err(err) => debug!("dropping malformed notification params: {err}"),
                }
            }
        })
        .await;
    }

    /// Register a pending slot for an id the caller is about to send as an
    /// outbound Request. Must be called before the request hits the wire so
    /// a fast peer response is never dropped for lack of a matching slot.
    pub async fn register_pending(&self, id: RequestId) -> oneshot::Receiver<Result<Value, ResponseError>> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock().await;
        state.pending.insert(id, tx);
        rx
    }

    /// Obtain the next monotonically increasing outbound id and register its
    /// pending slot in the same critical section, guaranteeing the id is
    /// unique and strictly greater than every id issued before it.
    pub async fn register_next_pending(
        &self,
    ) -> (RequestId, oneshot::Receiver<Result<Value, ResponseError>>) {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock().await;
        let id = RequestId::Number(state.next_id);
        state.next_id += 1;
        state.pending.insert(id.clone(), tx);
        (id, rx)
    }

    /// Abort one outstanding outbound request, e.g. on caller timeout.
    pub async fn cancel_pending(&self, id: &RequestId) {
        let mut state = self.state.lock().await;
        state.pending.remove(id);
    }

    /// Abort every outstanding outbound request, e.g. on connection close.
    pub async fn cancel_all(&self) {
        let mut state = self.state.lock().await;
        state.pending.clear();
        for token in state.inbound_cancel.values() {
            token.cancel();
        }
        state.inbound_cancel.clear();
    }

    /// Route one decoded message. Returns the Response to send back, if any
    /// was produced (Requests and the unparseable-request case only).
    pub async fn dispatch(&self, message: Message) -> Option<Message> {
        match message {
            Message::Request { id, method, params } => {
                self.dispatch_request(id, method, params).await
            }
            Message::Notification { method, params } => {
                self.dispatch_notification(method, params).await;
                None
            }
            Message::Response { id, result, error } => {
                self.dispatch_response(id, result, error).await;
                None
            }
        }
    }

    async fn dispatch_request(
        &self,
        id: RequestId,
        method: String,
        params: Option<Value>,
    ) -> Option<Message> {
        crate::log_jsonrpc_message!(tracing::Level::TRACE, "incoming", &method, &params);

        let handler = {
            let state = self.state.lock().await;
            state.requests.get(&method).cloned()
        };

        let Some(handler) = handler else {
            debug!("no request handler registered for {method}");
            return Some(Message::failure(
                Some(id),
                ResponseError::method_not_found(&method),
            ));
        };

        let token = CancellationToken::new();
        {
            let mut state = self.state.lock().await;
            state.inbound_cancel.insert(id.clone(), token.clone());
        }

        trace!("dispatching request {id} ({method})");
        let outcome = tokio::select! {
            result = handler.handle(params) => Some(result),
            _ = token.cancelled() => None,
        };

        {
            let mut state = self.state.lock().await;
            state.inbound_cancel.remove(&id);
        }

        let response = match outcome {
            None => Message::failure(Some(id), ResponseError::request_cancelled()),
            Some(Ok(result)) => Message::success(id, result),
            Some(Err(err)) => Message::failure(Some(id), err.into_response_error()),
        };
        Some(response)
    }

    async fn dispatch_notification(&self, method: String, params: Option<Value>) {
        if method == CANCEL_METHOD {
            self.handle_cancel_request(params).await;
            return;
        }

        let handler = {
            let state = self.state.lock().await;
            state.notifications.get(&method).cloned()
        };

        if let Some(handler) = handler {
            handler.handle(params).await;
        } else {
            debug!("no notification handler registered for {method}, ignoring");
        }
    }

    async fn handle_cancel_request(&self, params: Option<Value>) {
        let Some(id) = params
            .as_ref()
            .and_then(|p| p.get("id"))
            .and_then(RequestId::from_json)
        else {
            debug!("$/cancelRequest missing or invalid \"id\", ignoring");
            return;
        };

        let token = {
            let mut state = self.state.lock().await;
            state.inbound_cancel.remove(&id)
        };

        match token {
            Some(token) => token.cancel(),
            None => debug!("$/cancelRequest for unknown id {id}, ignoring"),
        }
    }

    async fn dispatch_response(
        &self,
        id: Option<RequestId>,
        result: Option<Value>,
        error: Option<ResponseError>,
    ) {
        let Some(id) = id else {
            debug!("dropping response with unrecoverable id");
            return;
        };

        let sender = {
            let mut state = self.state.lock().await;
            state.pending.remove(&id)
        };

        let Some(sender) = sender else {
            debug!("dropping response for unknown request id {id}");
            return;
        };

        let payload = match error {
            Some(error) => Err(error),
            None => Ok(result.unwrap_or(Value::Null)),
        };

        if sender.send(payload).is_err() {
            warn!("pending request {id} no longer has a receiver");
        }
    }
}

impl ResponseError {
    fn internal_error_with(detail: impl Into<String>) -> Self {
        debug!("encoding typed result failed: {}", detail.into());
        ResponseError::internal_error()
    }
}
