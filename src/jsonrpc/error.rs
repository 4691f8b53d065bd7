//! Error taxonomy for the JSON-RPC core.
//!
//! Mirrors the teacher crate's `JsonRpcError` shape: one `#[error(...)]`
//! variant per failure mode, `#[from]` conversions from the layer below.

use crate::jsonrpc::codec::FramingError;
use crate::jsonrpc::message::ResponseError;

/// Errors surfaced by the `Dispatcher` and `Connection`.
#[derive(Debug, thiserror::Error)]
pub enum JsonRpcError {
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("peer returned an error ({code}): {message}")]
    Peer {
        code: i32,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("request timed out")]
    Timeout,

    #[error("request was cancelled")]
    Cancelled,

    #[error("connection is closed")]
    ConnectionClosed,

    #[error("failed to serialize request parameters: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to decode response result")]
    ResultDecode(serde_json::Error),

    #[error("response carried neither a result nor an error")]
    MissingResult,
}

impl From<ResponseError> for JsonRpcError {
    fn from(error: ResponseError) -> Self {
        JsonRpcError::Peer {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}
