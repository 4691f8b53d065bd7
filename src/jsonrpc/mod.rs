//! Transport-independent JSON-RPC 2.0 core: message model, framing codec,
//! dispatcher, and connection. This is the engine an LSP (or any other
//! JSON-RPC-based) server/client is built on; it knows nothing about any
//! particular set of methods or payload shapes.

pub mod codec;
pub mod connection;
pub mod dispatcher;
pub mod either;
pub mod error;
pub mod message;

pub use codec::{encode, Decoder, Frame, FramingError, MAX_CONTENT_LENGTH};
pub use connection::Connection;
pub use dispatcher::{Dispatcher, HandlerError, NotificationHandler, RequestHandler};
pub use either::{discriminate, Either, Either3};
pub use error::JsonRpcError;
pub use message::{error_codes, DecodeError, Message, RequestId, ResponseError, JSONRPC_VERSION};
