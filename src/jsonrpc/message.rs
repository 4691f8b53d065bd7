//! JSON-RPC 2.0 message model
//!
//! A closed tagged union over the three message shapes defined by the
//! JSON-RPC 2.0 specification, plus the identifiers and error object that
//! glue requests to responses.

use serde_json::Value;
use std::fmt;

/// The fixed `jsonrpc` version string every message carries on the wire.
pub const JSONRPC_VERSION: &str = "2.0";

/// An identifier established by the client: either a signed integer or a
/// non-empty string. Numbers stay numbers and strings stay strings across a
/// roundtrip — the decoder branches on the JSON type, never on whether a
/// string happens to look numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        RequestId::Number(value)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        RequestId::String(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId::String(value.to_string())
    }
}

impl RequestId {
    /// Decode a `RequestId` from a JSON value. Returns `None` if `value` is
    /// neither a JSON number nor a non-empty JSON string (including `null`
    /// and `""`, which the specification does not allow as an id).
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RequestId::Number),
            Value::String(s) if !s.is_empty() => Some(RequestId::String(s.clone())),
            _ => None,
        }
    }

    /// Encode this id back to JSON, preserving the original variant.
    pub fn to_json(&self) -> Value {
        match self {
            RequestId::Number(n) => Value::from(*n),
            RequestId::String(s) => Value::String(s.clone()),
        }
    }
}

/// JSON-RPC error codes, including the LSP extensions.
/// <https://microsoft.github.io/language-server-protocol/specifications/lsp/3.17/specification/#errorCodes>
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Server error range start/end, reserved for implementation-defined codes.
    pub const SERVER_ERROR_START: i32 = -32099;
    pub const SERVER_ERROR_END: i32 = -32000;

    pub const SERVER_NOT_INITIALIZED: i32 = -32002;
    pub const UNKNOWN_ERROR_CODE: i32 = -32001;

    pub const REQUEST_FAILED: i32 = -32803;
    pub const SERVER_CANCELLED: i32 = -32802;
    pub const CONTENT_MODIFIED: i32 = -32801;
    pub const REQUEST_CANCELLED: i32 = -32800;
}

/// The `error` member of a Response: `{code, message, data?}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

impl ResponseError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {method}"),
        )
    }

    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, reason.into())
    }

    pub fn internal_error() -> Self {
        Self::new(error_codes::INTERNAL_ERROR, "Internal error")
    }

    pub fn request_cancelled() -> Self {
        Self::new(error_codes::REQUEST_CANCELLED, "Request cancelled")
    }

    fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("code".to_string(), Value::from(self.code));
        obj.insert("message".to_string(), Value::String(self.message.clone()));
        if let Some(data) = &self.data {
            obj.insert("data".to_string(), data.clone());
        }
        Value::Object(obj)
    }

    fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let code = obj.get("code")?.as_i64()? as i32;
        let message = obj.get("message")?.as_str()?.to_string();
        let data = obj.get("data").cloned();
        Some(Self {
            code,
            message,
            data,
        })
    }
}

/// A single JSON-RPC 2.0 message: a Request, a Response, or a Notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request {
        id: RequestId,
        method: String,
        params: Option<Value>,
    },
    Response {
        /// `None` only when responding to a request whose id could not be
        /// recovered (e.g. an unparseable Request).
        id: Option<RequestId>,
        result: Option<Value>,
        error: Option<ResponseError>,
    },
    Notification {
        method: String,
        params: Option<Value>,
    },
}

impl Message {
    pub fn request(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Message::Request {
            id,
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Message::Notification {
            method: method.into(),
            params,
        }
    }

    pub fn success(id: RequestId, result: Value) -> Self {
        Message::Response {
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<RequestId>, error: ResponseError) -> Self {
        Message::Response {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Serialize this message to its JSON representation. Absent optional
    /// fields are omitted entirely, never written as `"field":null` — the one
    /// exception is a Response's `id`, which is serialized as `null` when the
    /// originating request's id could not be recovered.
    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert(
            "jsonrpc".to_string(),
            Value::String(JSONRPC_VERSION.to_string()),
        );
        match self {
            Message::Request { id, method, params } => {
                obj.insert("id".to_string(), id.to_json());
                obj.insert("method".to_string(), Value::String(method.clone()));
                if let Some(params) = params {
                    obj.insert("params".to_string(), params.clone());
                }
            }
            Message::Response { id, result, error } => {
                obj.insert(
                    "id".to_string(),
                    id.as_ref().map(RequestId::to_json).unwrap_or(Value::Null),
                );
                if let Some(result) = result {
                    obj.insert("result".to_string(), result.clone());
                }
                if let Some(error) = error {
                    obj.insert("error".to_string(), error.to_json());
                }
            }
            Message::Notification { method, params } => {
                obj.insert("method".to_string(), Value::String(method.clone()));
                if let Some(params) = params {
                    obj.insert("params".to_string(), params.clone());
                }
            }
        }
        Value::Object(obj)
    }

    /// Classify and decode a parsed JSON value into a `Message`.
    ///
    /// Follows the classification order from the specification exactly:
    /// the `jsonrpc` version is checked first, then the mutual exclusion of
    /// `result`/`error`, then the presence of `id`/`method` decides the
    /// variant.
    pub fn from_json(value: &Value) -> Result<Self, DecodeError> {
        let obj = value
            .as_object()
            .ok_or_else(|| DecodeError::invalid_request("message is not a JSON object"))?;

        match obj.get("jsonrpc").and_then(Value::as_str) {
            Some(JSONRPC_VERSION) => {}
            _ => {
                return Err(DecodeError::invalid_request(
                    "missing or unexpected \"jsonrpc\" version",
                ));
            }
        }

        let has_result = obj.contains_key("result");
        let has_error = obj.contains_key("error");
        if has_result && has_error {
            return Err(DecodeError::invalid_request(
                "\"result\" and \"error\" are mutually exclusive",
            ));
        }

        let id = obj.get("id");
        let method = obj.get("method");

        match (id, method) {
            (Some(id_value), Some(method_value)) if !id_value.is_null() => {
                let id = RequestId::from_json(id_value)
                    .ok_or_else(|| DecodeError::invalid_request("invalid request id"))?;
                let method = method_value
                    .as_str()
                    .filter(|m| !m.is_empty())
                    .ok_or_else(|| DecodeError::invalid_request("method must be a non-empty string"))?
                    .to_string();
                let params = obj.get("params").cloned();
                Ok(Message::Request { id, method, params })
            }
            (_, Some(method_value)) => {
                let method = method_value
                    .as_str()
                    .filter(|m| !m.is_empty())
                    .ok_or_else(|| DecodeError::invalid_request("method must be a non-empty string"))?
                    .to_string();
                let params = obj.get("params").cloned();
                Ok(Message::Notification { method, params })
            }
            (Some(id_value), None) if !id_value.is_null() => {
                let id = RequestId::from_json(id_value)
                    .ok_or_else(|| DecodeError::invalid_request("invalid response id"))?;
                let result = obj.get("result").cloned();
                let error = obj.get("error").and_then(ResponseError::from_json);
                Ok(Message::Response {
                    id: Some(id),
                    result,
                    error,
                })
            }
            (id, None) if has_result || has_error => {
                // Response to a request whose id could not be parsed: id is null.
                debug_assert!(id.map(Value::is_null).unwrap_or(true));
                let result = obj.get("result").cloned();
                let error = obj.get("error").and_then(ResponseError::from_json);
                Ok(Message::Response {
                    id: None,
                    result,
                    error,
                })
            }
            _ => Err(DecodeError::invalid_request(
                "message matches none of Request, Response, Notification",
            )),
        }
    }
}

/// Error raised while classifying a parsed JSON value as a `Message`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    pub code: i32,
    pub message: String,
}

impl DecodeError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: error_codes::INVALID_REQUEST,
            message: message.into(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for ResponseError {
    fn from(err: DecodeError) -> Self {
        ResponseError::new(err.code, err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_roundtrip_preserves_numeric_id() {
        let msg = Message::request(RequestId::Number(1), "ping", None);
        let json = msg.to_json();
        let decoded = Message::from_json(&json).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn string_id_is_never_coerced_to_number() {
        let msg = Message::request(RequestId::from("42"), "ping", None);
        let json = msg.to_json();
        assert_eq!(json["id"], json!("42"));
        let decoded = Message::from_json(&json).unwrap();
        match decoded {
            Message::Request { id, .. } => assert_eq!(id, RequestId::String("42".to_string())),
            _ => panic!("expected Request"),
        }
    }

    #[test]
    fn notification_has_no_id() {
        let msg = Message::notification("textDocument/didOpen", Some(json!({"a": 1})));
        let json = msg.to_json();
        assert!(json.get("id").is_none());
        assert_eq!(Message::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn response_result_and_error_are_mutually_exclusive() {
        let bad = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": 1,
            "error": {"code": -32600, "message": "bad"}
        });
        let err = Message::from_json(&bad).unwrap_err();
        assert_eq!(err.code, error_codes::INVALID_REQUEST);
    }

    #[test]
    fn wrong_jsonrpc_version_is_rejected() {
        let bad = json!({"jsonrpc": "1.0", "method": "x"});
        assert!(Message::from_json(&bad).is_err());
    }

    #[test]
    fn parse_error_response_has_null_id() {
        let response = json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "bad json"}});
        let decoded = Message::from_json(&response).unwrap();
        match decoded {
            Message::Response { id, error, .. } => {
                assert!(id.is_none());
                assert_eq!(error.unwrap().code, error_codes::PARSE_ERROR);
            }
            _ => panic!("expected Response"),
        }
    }

    #[test]
    fn optional_fields_are_omitted_not_null() {
        let msg = Message::request(RequestId::Number(1), "ping", None);
        let json = msg.to_json();
        assert!(json.as_object().unwrap().get("params").is_none());
    }

    #[test]
    fn empty_method_name_is_rejected() {
        let bad = json!({"jsonrpc": "2.0", "id": 1, "method": ""});
        assert!(Message::from_json(&bad).is_err());
    }

    #[test]
    fn empty_string_id_is_rejected() {
        assert_eq!(RequestId::from_json(&json!("")), None);
        let bad = json!({"jsonrpc": "2.0", "id": "", "method": "ping"});
        assert!(Message::from_json(&bad).is_err());
    }
}
