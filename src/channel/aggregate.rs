//! Response filtering and aggregation.
//!
//! After the child exits cleanly, its captured output is replayed line by
//! line through [`accept_line`], which keeps only the lines correlated to the
//! current exchange. [`aggregate`] then folds the accepted set into one
//! [`RequestResult`] according to the request's cardinality flags.

use serde_json::Value;
use tracing::debug;

use crate::key::CorrelationKey;

/// Warning attached to every pre-spawn validation failure.
pub(crate) const DEPENDENCY_WARNING: &str = "Warning: the targeted file was not found or cannot \
     be executed; check the file path and the language dependencies.";

/// Warning attached when the failure comes from inside the spawned program.
pub(crate) const REMOTE_FAULT_WARNING: &str =
    "Warning: this failure originates in the targeted program, not in the exchange layer.";

// ── RequestResult ─────────────────────────────────────────────────────────────

/// Caller-side outcome of one exchange.
///
/// `status_known` is `false` only when the request declared output optional
/// and the callee produced nothing: silence is not an error in that case,
/// and consumers must not treat `status == false` there as a hard failure.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestResult {
    /// Whether `status` carries a verdict at all.
    pub status_known: bool,
    /// Overall success of the exchange; meaningful only if `status_known`.
    pub status: bool,
    /// Response payload: the single response's `data` when `is_unique`, or a
    /// JSON array of every response's `data` in arrival order otherwise.
    pub data: Option<Value>,
    /// Echo of the request's `optionalOutput` flag.
    pub optional_output: bool,
    /// Echo of the request's `isUnique` flag.
    pub is_unique: bool,
    /// Warnings accumulated by the exchange, in order.
    pub warnings: Vec<String>,
    /// Errors accumulated by the exchange, in order.
    pub errors: Vec<String>,
}

impl RequestResult {
    /// Whether the exchange completed with a known, successful status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_known && self.status
    }

    /// The response payload, only when the exchange succeeded.
    #[must_use]
    pub fn data_if_ok(&self) -> Option<&Value> {
        if self.is_success() {
            self.data.as_ref()
        } else {
            None
        }
    }

    /// A failed result carrying `errors` and `warnings`.
    pub(crate) fn failure(
        errors: Vec<String>,
        warnings: Vec<String>,
        optional_output: bool,
        is_unique: bool,
    ) -> Self {
        Self {
            status_known: true,
            status: false,
            data: None,
            optional_output,
            is_unique,
            warnings,
            errors,
        }
    }

    /// The silence outcome: output was optional and none arrived.
    pub(crate) fn silent(optional_output: bool, is_unique: bool) -> Self {
        Self {
            status_known: false,
            status: false,
            data: None,
            optional_output,
            is_unique,
            warnings: vec![
                "Warning: output is optional and the targeted program produced none.".to_owned(),
            ],
            errors: Vec::new(),
        }
    }
}

// ── Line acceptance ───────────────────────────────────────────────────────────

/// Parse one captured output line and decide whether it belongs to `key`.
///
/// Accepted lines are JSON objects whose `key` field is JSON `null` or a
/// string equal to the exchange key. Everything else (non-JSON noise,
/// non-object values, objects without a `key`, foreign keys) is discarded
/// without error: such lines are not malformed, they simply belong to a
/// different correlation, or to no protocol at all.
pub fn accept_line(line: &str, key: &CorrelationKey) -> Option<Value> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        debug!("request channel: dropping non-JSON output line");
        return None;
    };

    let candidate = value.as_object()?.get("key")?;
    if key.accepts(candidate) {
        Some(value)
    } else {
        debug!("request channel: dropping line with foreign correlation key");
        None
    }
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Fold the accepted response set into a [`RequestResult`].
///
/// Overall status is the logical AND of every `request_status` field found.
/// With `is_unique`, exactly one response is allowed; any other count is a
/// cardinality violation that discards the payload even when it was
/// individually valid. Without it, payloads aggregate into a JSON array in
/// arrival order.
pub fn aggregate(
    accepted: Vec<Value>,
    is_unique: bool,
    optional_output: bool,
) -> RequestResult {
    if accepted.is_empty() {
        if optional_output {
            return RequestResult::silent(optional_output, is_unique);
        }
        return RequestResult::failure(
            vec![
                "Error: the response channel was never opened on the targeted side, or was used \
                 incorrectly."
                    .to_owned(),
            ],
            Vec::new(),
            optional_output,
            is_unique,
        );
    }

    let mut status = true;
    let mut errors = Vec::new();
    for response in &accepted {
        if response.get("request_status").and_then(Value::as_bool) == Some(false) {
            status = false;
        }
        if let Some(remote_errors) = response.get("errors").and_then(Value::as_array) {
            errors.extend(
                remote_errors
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned),
            );
        }
    }

    let mut payloads: Vec<Value> = accepted
        .iter()
        .map(|r| r.get("data").cloned().unwrap_or(Value::Null))
        .collect();

    let data = if is_unique {
        if payloads.len() == 1 {
            Some(payloads.remove(0))
        } else {
            status = false;
            errors.push(format!(
                "Error: response cardinality violated: expected exactly 1 response \
                 (isUnique: true) but received {}.",
                payloads.len()
            ));
            None
        }
    } else {
        Some(Value::Array(payloads))
    };

    RequestResult {
        status_known: true,
        status,
        data,
        optional_output,
        is_unique,
        warnings: Vec::new(),
        errors,
    }
}
