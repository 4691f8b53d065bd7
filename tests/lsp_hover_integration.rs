//! Exercises the typed dispatcher/connection API with a real `lsp-types`
//! payload shape. This is the reason the crate depends on `lsp-types` at
//! all: it supplies the LSP data-type catalog the generic JSON-RPC layer
//! carries but deliberately does not reimplement (see `src/lib.rs`).

use lsp_rpc_toolkit::jsonrpc::Connection;
use lsp_rpc_toolkit::protocol::text_document;
use lsp_rpc_toolkit::transport::MockTransport;
use lsp_types::{
    Hover, HoverContents, HoverParams, MarkedString, Position, TextDocumentIdentifier,
    TextDocumentPositionParams, Url, WorkDoneProgressParams,
};
use std::sync::Arc;
use std::time::Duration;

/// A `hover` request encoded through `request_typed`, looped back through
/// the same connection's decoder, dispatched to a handler registered with
/// `on_typed_request`, and its `lsp_types::Hover` result decoded back out.
#[tokio::test]
async fn hover_request_round_trips_a_real_lsp_types_payload() {
    let connection = Arc::new(Connection::new(MockTransport::new()));

    connection
        .on_typed_request(text_document::HOVER, |params: HoverParams| async move {
            assert_eq!(params.text_document_position_params.position.line, 4);
            Ok(Hover {
                contents: HoverContents::Scalar(MarkedString::String(
                    "it's a variable".to_string(),
                )),
                range: None,
            })
        })
        .await;

    let params = HoverParams {
        text_document_position_params: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier {
                uri: Url::parse("file:///a.rs").unwrap(),
            },
            position: Position {
                line: 4,
                character: 2,
            },
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
    };

    let caller = Arc::clone(&connection);
    let call = tokio::spawn(async move {
        caller
            .request_typed::<_, Hover>(text_document::HOVER, &params, Duration::from_secs(1))
            .await
    });

    // No real socket here: pop the outbound request and feed it straight
    // back in as inbound, the same bytes a transport would carry, then do
    // the same for the response the handler produces.
    let request_bytes = connection.next_outgoing().await.unwrap();
    connection.receive(&request_bytes).await.unwrap();
    let response_bytes = connection.next_outgoing().await.unwrap();
    connection.receive(&response_bytes).await.unwrap();

    let hover = call.await.unwrap().unwrap();
    match hover.contents {
        HoverContents::Scalar(MarkedString::String(text)) => {
            assert_eq!(text, "it's a variable");
        }
        other => panic!("unexpected hover contents: {other:?}"),
    }
    assert!(hover.range.is_none());
}
