//! Wire envelope types.
//!
//! The wire format is newline-delimited JSON over the child's stdio: one
//! request line caller → callee, one response line per emit callee → caller.
//! Field names are fixed by the protocol (`optionalOutput`, `isUnique`,
//! `request_status`) and must not drift with Rust naming conventions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One outgoing request line (caller → callee).
///
/// Immutable once serialized. `data` preserves the original JSON type of the
/// caller's payload; a caller that passes malformed JSON gets an explicit
/// `null` here rather than a rejected request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlation key, 32 lowercase hex characters.
    pub key: String,
    /// Whether the callee is allowed to produce zero responses.
    #[serde(rename = "optionalOutput")]
    pub optional_output: bool,
    /// Whether exactly one response is expected (`true`) or any number (`false`).
    #[serde(rename = "isUnique")]
    pub is_unique: bool,
    /// Request payload, any JSON value.
    pub data: Value,
}

/// One response line (callee → caller).
///
/// `key` is `None` only on the pre-initialization failure line a callee
/// writes when it never read a valid request envelope; the caller accepts
/// that line for the current exchange regardless of its own key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Echo of the request key, or `None` for a pre-initialization error.
    pub key: Option<String>,
    /// Whether this particular emit succeeded.
    pub request_status: bool,
    /// Response payload, any JSON value.
    pub data: Value,
    /// Echo of the request's `optionalOutput` flag.
    #[serde(rename = "optionalOutput")]
    pub optional_output: bool,
    /// Echo of the request's `isUnique` flag; `None` before initialization.
    #[serde(rename = "isUnique")]
    pub is_unique: Option<bool>,
    /// Error messages accumulated on the callee side, in order.
    pub errors: Vec<String>,
    /// Warning messages accumulated on the callee side, in order.
    pub warnings: Vec<String>,
}

/// Serialize any value into a JSON string suitable for the `data` argument of
/// [`RequestChannel::send`](crate::channel::RequestChannel::send) or
/// [`ResponseChannel::emit`](crate::guest::ResponseChannel::emit).
///
/// Falls back to the literal `"null"` if serialization fails, mirroring the
/// protocol's downgrade-to-null policy for unusable payloads.
#[must_use]
pub fn bundle<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_owned())
}
