use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::codec::TYPE_FIELD;

/// Error code whose message must never be shown to a user or written to a log.
pub const SUPPRESSED_ERROR_CODE: i32 = 406;

/// Failure to turn a wire payload into a typed object.
///
/// Decode errors are always local: they never involve the transport and never
/// take down the reader loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The `@type` of the payload is not one of the variants known for `expected`.
    #[error("unknown @type '{tag}' (expected {expected})")]
    UnknownTag { tag: String, expected: &'static str },

    /// A required field (or the `@type` discriminant itself) is absent or null.
    #[error("{type_name}: missing field '{field}'")]
    MissingField {
        type_name: &'static str,
        field: &'static str,
    },

    /// A field is present but its JSON type does not match the declared type.
    #[error("{type_name}.{field}: expected {expected}, found {found}")]
    TypeMismatch {
        type_name: &'static str,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// The payload is not JSON at all.
    #[error("invalid JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err.to_string())
    }
}

/// An error reported by the engine for one specific request.
///
/// Messages for [`SUPPRESSED_ERROR_CODE`] are dropped at construction and can
/// never be recovered from this type.
#[derive(Clone, PartialEq, Eq)]
pub struct RpcError {
    code: i32,
    message: Option<String>,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        let message = if code == SUPPRESSED_ERROR_CODE {
            None
        } else {
            Some(message.into())
        };
        Self { code, message }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    /// The engine's message, or `None` when it was suppressed.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether this error may be shown to an end user.
    pub fn is_displayable(&self) -> bool {
        self.code != SUPPRESSED_ERROR_CODE
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "engine error {}: {}", self.code, message),
            None => write!(f, "engine error {}", self.code),
        }
    }
}

impl fmt::Debug for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcError")
            .field("code", &self.code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for RpcError {}

/// Failure of a single call made through the correlator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("request timed out")]
    Timeout,

    #[error("request was cancelled")]
    Cancelled,

    #[error("session is closing")]
    SessionClosing,

    #[error("transport closed")]
    TransportClosed,

    /// The response arrived but does not decode into the expected type.
    #[error("failed to decode response: {0}")]
    Decode(#[from] DecodeError),

    #[error("correlation token '{0}' is already in use")]
    DuplicateToken(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CallError {
    /// Session-wide failures, as opposed to failures of this call only.
    pub fn is_global(&self) -> bool {
        matches!(self, CallError::SessionClosing | CallError::TransportClosed)
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Frame(String),

    #[error("transport closed")]
    Closed,
}

/// Removes the message of every error object with the suppressed code from
/// `value`, however deeply it is nested. Apply before a payload is logged or
/// printed.
pub fn redact_suppressed(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let suppressed = map.get(TYPE_FIELD).and_then(Value::as_str) == Some("error")
                && map.get("code").and_then(Value::as_i64) == Some(SUPPRESSED_ERROR_CODE.into());
            if suppressed {
                map.remove("message");
            }
            map.values_mut().for_each(redact_suppressed);
        }
        Value::Array(items) => items.iter_mut().for_each(redact_suppressed),
        _ => {}
    }
}
