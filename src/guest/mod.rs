//! Callee side of the exchange.
//!
//! Code running inside the invoked program opens a [`ResponseChannel`] as its
//! first act. Opening suppresses the process's stdout (so hosted-program
//! writes cannot pollute the protocol), reads the whole request envelope from
//! stdin, and leaves the channel ready to [`emit`](ResponseChannel::emit)
//! responses. The channel is an explicit state machine:
//!
//! ```text
//! Uninitialized ──emit──▶ Faulted          (no readable request; one
//!      │                                    key=null failure line, then
//!      │ envelope parsed                    silence)
//!      ▼
//!    Ready ──emit──▶ EmittedOnce           (isUnique: further emits write
//!      │                                    cardinality-failure lines)
//!      │ emit, isUnique=false
//!      ▼
//!  EmittedMany ──emit──▶ EmittedMany
//!
//! any state ──close──▶ Closed              (gate released, emits ignored)
//! ```
//!
//! The stdout stream is the only shared mutable resource: it stays suppressed
//! whenever hosted code runs, and protocol lines reach the real stream only
//! through the gate's saved handle, so the two can never interleave.

pub mod gate;

use std::io::Read;

use serde_json::Value;
use tracing::{debug, warn};

pub use gate::{OutputGate, StdioGate};

use crate::envelope::ResponseEnvelope;

static JSON_NULL: Value = Value::Null;

/// Channel lifecycle states; see the module docs for the transition diagram.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ChannelState {
    Uninitialized,
    Faulted,
    Ready,
    EmittedOnce,
    EmittedMany,
    Closed,
}

/// The request as read at open time, with per-field lenient defaults.
#[derive(Debug, Clone)]
struct RequestSnapshot {
    key: String,
    data: Value,
    optional_output: bool,
    is_unique: bool,
}

/// Callee-side exchange channel.
///
/// One instance per process lifetime; create it before any hosted code runs
/// and [`close`](ResponseChannel::close) it at teardown ([`Drop`] is a
/// backstop). Accessors never fail: absent or mistyped request data projects
/// to a zero value.
#[derive(Debug)]
pub struct ResponseChannel<G: OutputGate = StdioGate> {
    state: ChannelState,
    gate: G,
    request: Option<RequestSnapshot>,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ResponseChannel {
    /// Open the channel on the process's real stdio.
    ///
    /// Suppresses stdout, then reads stdin to EOF and parses the request
    /// envelope. Never fails: an unreadable or non-object input leaves the
    /// channel `Uninitialized`, which the first emit reports back to the
    /// caller as a `key: null` failure line.
    #[must_use]
    pub fn open() -> Self {
        Self::open_with(std::io::stdin().lock(), StdioGate::new())
    }
}

impl<G: OutputGate> ResponseChannel<G> {
    /// Open the channel over an explicit input source and output gate.
    ///
    /// This is the seam the test suite uses; production code goes through
    /// [`ResponseChannel::open`].
    pub fn open_with<R: Read>(mut input: R, mut gate: G) -> Self {
        // Claim the output stream before anything else can write to it.
        gate.engage();

        let mut raw = String::new();
        if let Err(e) = input.read_to_string(&mut raw) {
            warn!(error = %e, "response channel: failed to read the request stream");
        }

        let request = parse_request(&raw);
        let state = if request.is_some() {
            ChannelState::Ready
        } else {
            debug!("response channel: no readable request envelope");
            ChannelState::Uninitialized
        };

        Self {
            state,
            gate,
            request,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    // ── Request projections ──────────────────────────────────────────────────

    /// The request payload, or JSON `null` when absent.
    #[must_use]
    pub fn data(&self) -> &Value {
        self.request.as_ref().map_or(&JSON_NULL, |r| &r.data)
    }

    /// The request payload as an integer; `0` when absent or not a number.
    /// Fractional numbers truncate toward zero.
    #[must_use]
    pub fn data_int(&self) -> i64 {
        let data = self.data();
        data.as_i64()
            .unwrap_or_else(|| data.as_f64().map_or(0, |f| f.trunc() as i64))
    }

    /// The request payload as a float; `0.0` when absent or not a number.
    #[must_use]
    pub fn data_double(&self) -> f64 {
        self.data().as_f64().unwrap_or(0.0)
    }

    /// The request payload as a string; empty when absent or not a string.
    #[must_use]
    pub fn data_string(&self) -> String {
        self.data().as_str().map_or_else(String::new, str::to_owned)
    }

    /// The request payload as a boolean; `false` when absent or not a boolean.
    #[must_use]
    pub fn data_bool(&self) -> bool {
        self.data().as_bool().unwrap_or(false)
    }

    /// The correlation key of the request; empty when none was readable.
    #[must_use]
    pub fn request_key(&self) -> &str {
        self.request.as_ref().map_or("", |r| r.key.as_str())
    }

    /// Whether the caller declared the output optional; `true` by default.
    #[must_use]
    pub fn optional_output(&self) -> bool {
        self.request.as_ref().map_or(true, |r| r.optional_output)
    }

    /// Whether the caller expects exactly one response; `true` by default.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.request.as_ref().map_or(true, |r| r.is_unique)
    }

    // ── Emission ─────────────────────────────────────────────────────────────

    /// Emit one response line.
    ///
    /// `data` is parsed as JSON, falling back to JSON `null` when unparsable.
    /// The first emit (or any emit under `isUnique: false`) writes a success
    /// line. Further emits under `isUnique: true` still write a line, but
    /// with `request_status: false` and the accumulated cardinality error, so
    /// the caller can detect and enumerate the violation. Emits before a
    /// readable request announce the fault exactly once; emits after
    /// [`close`](ResponseChannel::close) are ignored.
    pub fn emit(&mut self, data: &str) {
        match self.state {
            ChannelState::Uninitialized => self.announce_fault(),
            ChannelState::Faulted => {
                debug!("response channel: fault already announced, ignoring emit");
            }
            ChannelState::Closed => {
                debug!("response channel: emit after close ignored");
            }
            ChannelState::Ready | ChannelState::EmittedMany => self.emit_response(data),
            ChannelState::EmittedOnce => self.emit_violation(data),
        }
    }

    /// Tear the channel down: restore the output stream and clear state.
    /// Idempotent.
    pub fn close(&mut self) {
        if self.state == ChannelState::Closed {
            return;
        }
        self.gate.release();
        self.errors.clear();
        self.warnings.clear();
        self.state = ChannelState::Closed;
        debug!("response channel: closed");
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// One-time `key: null` failure line for emit-before-init.
    fn announce_fault(&mut self) {
        warn!("response channel: emit without a readable request");
        self.errors
            .push("Error: the response channel is not initialized.".to_owned());
        let envelope = ResponseEnvelope {
            key: None,
            request_status: false,
            data: Value::Null,
            optional_output: true,
            is_unique: None,
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
        };
        self.write(&envelope);
        self.state = ChannelState::Faulted;
    }

    /// Success line; transitions to the emitted state matching `isUnique`.
    fn emit_response(&mut self, data: &str) {
        let Some(request) = self.request.as_ref() else {
            return;
        };
        let envelope = ResponseEnvelope {
            key: Some(request.key.clone()),
            request_status: true,
            data: parse_payload(data),
            optional_output: request.optional_output,
            is_unique: Some(request.is_unique),
            errors: Vec::new(),
            warnings: Vec::new(),
        };
        let next = if request.is_unique {
            ChannelState::EmittedOnce
        } else {
            ChannelState::EmittedMany
        };
        self.write(&envelope);
        self.state = next;
    }

    /// Cardinality-violation line; the envelope is still written so the
    /// caller can detect and report the abuse.
    fn emit_violation(&mut self, data: &str) {
        self.errors
            .push("Error: response cardinality exceeded (isUnique: true).".to_owned());
        let Some(request) = self.request.as_ref() else {
            return;
        };
        let envelope = ResponseEnvelope {
            key: Some(request.key.clone()),
            request_status: false,
            data: parse_payload(data),
            optional_output: request.optional_output,
            is_unique: Some(request.is_unique),
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
        };
        self.write(&envelope);
    }

    /// Serialize and write one protocol line through the gate.
    fn write(&mut self, envelope: &ResponseEnvelope) {
        match serde_json::to_string(envelope) {
            Ok(line) => {
                if let Err(e) = self.gate.write_line(&line) {
                    warn!(error = %e, "response channel: protocol write failed");
                }
            }
            Err(e) => warn!(error = %e, "response channel: envelope serialization failed"),
        }
    }
}

impl<G: OutputGate> Drop for ResponseChannel<G> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Lenient request parse: any JSON object counts as a request, with absent or
/// mistyped fields taking protocol defaults. Non-object input yields `None`.
fn parse_request(raw: &str) -> Option<RequestSnapshot> {
    let value: Value = serde_json::from_str(raw.trim()).ok()?;
    let object = value.as_object()?;
    Some(RequestSnapshot {
        key: object
            .get("key")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        data: object.get("data").cloned().unwrap_or(Value::Null),
        optional_output: object
            .get("optionalOutput")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        is_unique: object
            .get("isUnique")
            .and_then(Value::as_bool)
            .unwrap_or(true),
    })
}

/// Parse an emit payload, downgrading unparsable input to JSON `null`.
fn parse_payload(data: &str) -> Value {
    serde_json::from_str(data).unwrap_or(Value::Null)
}
