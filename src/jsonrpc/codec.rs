//! Content-Length framing codec.
//!
//! Wire format per message:
//!
//! ```text
//! Content-Length: <N>\r\n
//! [ignored headers]\r\n
//! \r\n
//! <N bytes of UTF-8 JSON>
//! ```
//!
//! `N` is a byte count, not a character count — the decoder works on raw
//! bytes throughout and never converts the buffer to a `String` before the
//! body has been sliced out, so multi-byte UTF-8 bodies frame correctly.

use crate::jsonrpc::message::{error_codes, Message, ResponseError};
use std::fmt;

/// Cap on a single frame's `Content-Length`, guarding against an adversarial
/// peer driving the decoder's buffer to unbounded size.
pub const MAX_CONTENT_LENGTH: usize = 100 * 1024 * 1024; // 100 MiB

const HEADER_DELIMITER: &[u8] = b"\r\n\r\n";

/// A framing-level failure. Unrecoverable for the stream it occurred on —
/// the caller should close the transport rather than attempt to resync.
#[derive(Debug, Clone, PartialEq)]
pub enum FramingError {
    MissingContentLength,
    DuplicateContentLength,
    InvalidContentLength(String),
    ContentLengthTooLarge { length: usize, max: usize },
    InvalidUtf8,
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramingError::MissingContentLength => write!(f, "Missing Content-Length header"),
            FramingError::DuplicateContentLength => write!(f, "Duplicate Content-Length header"),
            FramingError::InvalidContentLength(v) => write!(f, "Invalid Content-Length: {v}"),
            FramingError::ContentLengthTooLarge { length, max } => write!(
                f,
                "Content-Length {length} exceeds the {max}-byte implementation cap"
            ),
            FramingError::InvalidUtf8 => write!(f, "message body is not valid UTF-8"),
        }
    }
}

impl std::error::Error for FramingError {}

/// One complete, correctly-framed message pulled off the wire.
///
/// A frame that parsed as JSON but failed message classification (wrong
/// `jsonrpc`, unclassifiable shape, …) or that wasn't even valid JSON is
/// still a *frame* — the `Content-Length` accounting was correct — so it
/// never becomes a `FramingError`. It carries the `ResponseError` the peer
/// should receive instead, and decoding continues with the next frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Message(Message),
    Invalid(ResponseError),
}

/// Encode one message as a `Content-Length`-framed byte payload. No headers
/// beyond `Content-Length` are written.
pub fn encode(message: &Message) -> Vec<u8> {
    let body = serde_json::to_vec(&message.to_json()).expect("Message always serializes");
    let mut framed = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    framed.extend_from_slice(&body);
    framed
}

/// Streaming decoder state: a growable byte buffer plus the parsed
/// Content-Length once headers have been consumed.
#[derive(Default)]
pub struct Decoder {
    buffer: Vec<u8>,
    content_length: Option<usize>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all state. Used to re-synchronize a *new* connection after an
    /// unrecoverable framing error — never the same stream, which must be
    /// closed instead.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.content_length = None;
    }

    /// Feed newly-arrived bytes and drain as many complete frames as the
    /// buffer now contains. Never returns a partial frame: either zero or
    /// more complete `Frame`s, or a `FramingError`.
    ///
    /// Only a genuine framing failure — a bad `Content-Length` header or a
    /// body that isn't valid UTF-8 — is an `Err` here, and it is
    /// unrecoverable for the stream. A frame whose body doesn't parse as
    /// JSON or doesn't classify as a Request/Response/Notification is still
    /// correctly framed: it comes back as `Frame::Invalid` so the caller can
    /// respond with a PARSE_ERROR/INVALID_REQUEST and keep decoding the
    /// frames that follow it.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Frame>, FramingError> {
        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();

        loop {
            if self.content_length.is_none() {
                match self.try_parse_headers()? {
                    Some(length) => self.content_length = Some(length),
                    None => break,
                }
            }

            let length = self.content_length.expect("just set above");
            if self.buffer.len() < length {
                break;
            }

            let body: Vec<u8> = self.buffer.drain(..length).collect();
            self.content_length = None;

            let text = std::str::from_utf8(&body).map_err(|_| FramingError::InvalidUtf8)?;
            let frame = match serde_json::from_str::<serde_json::Value>(text) {
                Ok(value) => match Message::from_json(&value) {
                    Ok(message) => Frame::Message(message),
                    Err(decode_err) => Frame::Invalid(decode_err.into()),
                },
                Err(_) => Frame::Invalid(ResponseError::new(
                    error_codes::PARSE_ERROR,
                    "body is not valid JSON",
                )),
            };
            frames.push(frame);
        }

        Ok(frames)
    }

    /// Search for the header/body delimiter and, if found, parse and consume
    /// the header section, returning the declared body length.
    fn try_parse_headers(&mut self) -> Result<Option<usize>, FramingError> {
        let Some(delimiter_pos) = find_subslice(&self.buffer, HEADER_DELIMITER) else {
            return Ok(None);
        };

        let header_bytes = &self.buffer[..delimiter_pos];
        let header_text = std::str::from_utf8(header_bytes).map_err(|_| FramingError::InvalidUtf8)?;

        let mut content_length = None;
        for line in header_text.split("\r\n").filter(|l| !l.is_empty()) {
            if let Some(length) = parse_content_length_line(line)? {
                if content_length.is_some() {
                    return Err(FramingError::DuplicateContentLength);
                }
                content_length = Some(length);
            }
        }

        let content_length = content_length.ok_or(FramingError::MissingContentLength)?;
        self.buffer.drain(..delimiter_pos + HEADER_DELIMITER.len());
        Ok(Some(content_length))
    }
}

/// Parse a single header line. Returns `Ok(Some(n))` if it is a
/// `Content-Length` line with a valid value, `Ok(None)` if it is some other
/// (ignored) header, and `Err` if it names `Content-Length` but the value is
/// malformed or exceeds the implementation cap.
fn parse_content_length_line(line: &str) -> Result<Option<usize>, FramingError> {
    let Some((name, value)) = line.split_once(':') else {
        return Ok(None);
    };
    if !name.trim().eq_ignore_ascii_case("Content-Length") {
        return Ok(None);
    }

    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FramingError::InvalidContentLength(value.to_string()));
    }

    let length: usize = value
        .parse()
        .map_err(|_| FramingError::InvalidContentLength(value.to_string()))?;

    if length > MAX_CONTENT_LENGTH {
        return Err(FramingError::ContentLengthTooLarge {
            length,
            max: MAX_CONTENT_LENGTH,
        });
    }

    Ok(Some(length))
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
