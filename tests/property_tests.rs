//! Property-based tests for the quantified invariants of the JSON-RPC core:
//! message roundtrip, arbitrary-split streaming, and byte-exact UTF-8
//! framing.

use lsp_rpc_toolkit::jsonrpc::codec::{encode, Decoder, Frame};
use lsp_rpc_toolkit::jsonrpc::message::{Message, RequestId};
use proptest::prelude::*;
use serde_json::json;

fn expect_message(frame: &Frame) -> &Message {
    match frame {
        Frame::Message(message) => message,
        Frame::Invalid(error) => panic!("expected a valid message, got {error:?}"),
    }
}

fn arb_request_id() -> impl Strategy<Value = RequestId> {
    prop_oneof![
        any::<i64>().prop_map(RequestId::Number),
        "[a-zA-Z0-9_-]{1,16}".prop_map(RequestId::String),
    ]
}

fn arb_method() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9/_$]{0,30}"
}

fn arb_message() -> impl Strategy<Value = Message> {
    prop_oneof![
        (arb_request_id(), arb_method())
            .prop_map(|(id, method)| Message::request(id, method, Some(json!({"x": 1})))),
        arb_method().prop_map(|method| Message::notification(method, None)),
        arb_request_id().prop_map(|id| Message::success(id, json!(42))),
    ]
}

proptest! {
    /// decode(encode(M)) == M, for any message shape.
    #[test]
    fn message_roundtrips_through_json(message in arb_message()) {
        let json = message.to_json();
        let decoded = Message::from_json(&json).unwrap();
        prop_assert_eq!(decoded, message);
    }

    /// Feeding an arbitrary split of one frame's bytes across two `feed`
    /// calls always yields exactly the one message once all bytes arrive.
    #[test]
    fn arbitrary_split_feed_yields_the_full_message(
        message in arb_message(),
        split_fraction in 0.0f64..1.0,
    ) {
        let framed = encode(&message);
        let split = ((framed.len() as f64) * split_fraction) as usize;

        let mut decoder = Decoder::new();
        let mut frames = decoder.feed(&framed[..split]).unwrap();
        frames.extend(decoder.feed(&framed[split..]).unwrap());

        prop_assert_eq!(frames.len(), 1);
        prop_assert_eq!(expect_message(&frames[0]), &message);
    }

    /// A multi-byte UTF-8 params string frames and decodes correctly as long
    /// as Content-Length is the byte length, never the character count.
    #[test]
    fn utf8_params_roundtrip_by_byte_length(text in "\\PC{0,20}") {
        let message = Message::notification("m", Some(json!(text)));
        let framed = encode(&message);

        let mut decoder = Decoder::new();
        let frames = decoder.feed(&framed).unwrap();
        prop_assert_eq!(frames.len(), 1);
        prop_assert_eq!(expect_message(&frames[0]), &message);
    }

    /// Concatenating N independently-encoded frames and feeding them in one
    /// call yields exactly N messages, in order.
    #[test]
    fn concatenated_frames_decode_in_order(methods in prop::collection::vec(arb_method(), 1..8)) {
        let messages: Vec<Message> = methods
            .iter()
            .map(|m| Message::notification(m.clone(), None))
            .collect();

        let mut combined = Vec::new();
        for message in &messages {
            combined.extend(encode(message));
        }

        let mut decoder = Decoder::new();
        let frames = decoder.feed(&combined).unwrap();
        let decoded: Vec<Message> = frames.iter().map(|f| expect_message(f).clone()).collect();
        prop_assert_eq!(decoded, messages);
    }
}
