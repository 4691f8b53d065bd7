//! A reusable toolkit for building Language Server Protocol servers and
//! clients: the transport-independent JSON-RPC 2.0 engine ([`jsonrpc`]) plus
//! the generic LSP protocol-layer shapes an application wires it up with
//! ([`protocol`] method names, [`transport`] byte-stream factories).
//!
//! The full LSP data-type catalog (`Position`, `Hover`, `CompletionItem`,
//! capability trees, …) is not reimplemented here — bring the `lsp-types`
//! crate and decode/encode `textDocument/hover`-style payloads through
//! [`jsonrpc::Dispatcher::on_typed_request`] and
//! [`jsonrpc::Connection::request_typed`].

pub mod jsonrpc;
pub mod logging;
pub mod protocol;
pub mod transport;
