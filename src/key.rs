//! Correlation key generation and matching.
//!
//! Every exchange is bound to a fresh 128-bit random key rendered as 32
//! lowercase hex characters. The caller stamps the key into the request
//! envelope; response lines are accepted only when they echo the same key
//! (or carry a JSON `null` key, the pre-initialization error marker).

use std::fmt::{Display, Formatter};

use serde_json::Value;
use uuid::Uuid;

/// Random identifier binding one request to its response(s).
///
/// Generated from a v4 UUID, so two keys colliding within a session is not a
/// practical concern. Keys are created per [`send`](crate::channel::RequestChannel::send)
/// call and discarded once the matching responses are consumed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey(String);

impl CorrelationKey {
    /// Generate a fresh key: 32 lowercase hex characters of OS entropy.
    ///
    /// Never fails.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the hex rendering.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a response line's `key` field belongs to this exchange.
    ///
    /// JSON `null` always matches: a callee that could not read a valid
    /// request envelope has no key to echo, and exactly one request is in
    /// flight per channel, so the null-key response can only belong to it.
    #[must_use]
    pub fn accepts(&self, candidate: &Value) -> bool {
        candidate.is_null() || candidate.as_str() == Some(self.0.as_str())
    }
}

impl Display for CorrelationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
