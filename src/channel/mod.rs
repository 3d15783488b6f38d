//! Caller side of the exchange.
//!
//! A [`RequestChannel`] owns one outgoing request lifecycle: it stamps a
//! fresh correlation key, resolves the target into an argument vector,
//! serializes the request envelope, spawns the target with piped stdio,
//! writes the envelope to the child's stdin, and collects the child's stdout
//! line by line. After the child exits, lines correlated to the key are
//! aggregated into a [`RequestResult`].
//!
//! The exchange is fully synchronous from the caller's perspective:
//! [`RequestChannel::send`] returns only after the child has terminated (or
//! the configured deadline killed it). One request is resolved completely
//! before the next begins; concurrent use of one instance is not supported,
//! so use one instance per logical request.

pub mod aggregate;
pub mod codec;

use std::process::Stdio;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

pub use aggregate::RequestResult;
pub use codec::{LineCodec, DEFAULT_MAX_LINE_BYTES};

use crate::channel::aggregate::{DEPENDENCY_WARNING, REMOTE_FAULT_WARNING};
use crate::config::ExchangeConfig;
use crate::envelope::RequestEnvelope;
use crate::key::CorrelationKey;
use crate::resolve::Resolver;

/// Caller-side exchange channel.
///
/// Each [`send`](RequestChannel::send) call generates a fresh correlation
/// key, discarding the previous one; the key is owned exclusively by this
/// instance until the matching responses are consumed.
#[derive(Debug)]
pub struct RequestChannel {
    config: ExchangeConfig,
    resolver: Resolver,
    key: Option<CorrelationKey>,
}

impl RequestChannel {
    /// Create a channel with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ExchangeConfig::default())
    }

    /// Create a channel with explicit configuration.
    #[must_use]
    pub fn with_config(config: ExchangeConfig) -> Self {
        let resolver = Resolver::from_config(&config);
        Self {
            config,
            resolver,
            key: None,
        }
    }

    /// The correlation key of the most recent exchange, if any.
    #[must_use]
    pub fn correlation_key(&self) -> Option<&CorrelationKey> {
        self.key.as_ref()
    }

    /// Send one request and block until the exchange completes.
    ///
    /// `data` is parsed as JSON when non-empty; malformed input is silently
    /// downgraded to JSON `null`, never rejected. Validation failures
    /// short-circuit before any process is spawned. All failure modes are
    /// reported as data inside the returned [`RequestResult`].
    pub async fn send(
        &mut self,
        is_unique: bool,
        optional_output: bool,
        data: &str,
        language: &str,
        target: &str,
    ) -> RequestResult {
        let key = CorrelationKey::generate();
        self.key = Some(key.clone());

        let command = match self.resolver.resolve(language, target) {
            Ok(command) => command,
            Err(e) => {
                debug!(error = %e, "request channel: target validation failed, not spawning");
                return RequestResult::failure(
                    vec![format!("Error: {e}")],
                    vec![DEPENDENCY_WARNING.to_owned()],
                    optional_output,
                    is_unique,
                );
            }
        };

        let payload: Value = if data.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(data).unwrap_or(Value::Null)
        };

        let envelope = RequestEnvelope {
            key: key.to_string(),
            optional_output,
            is_unique,
            data: payload,
        };
        let request_line = match serde_json::to_string(&envelope) {
            Ok(line) => line,
            Err(e) => {
                return RequestResult::failure(
                    vec![format!("Error: failed to serialize request envelope: {e}")],
                    Vec::new(),
                    optional_output,
                    is_unique,
                );
            }
        };

        debug!(key = %key, command = %command, "request channel: spawning target");

        let mut child = match tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(command = %command, error = %e, "request channel: spawn failed");
                return RequestResult::failure(
                    vec![format!("Error: failed to start process: {e}")],
                    Vec::new(),
                    optional_output,
                    is_unique,
                );
            }
        };

        let Some(mut stdin) = child.stdin.take() else {
            return RequestResult::failure(
                vec!["Error: failed to capture child stdin.".to_owned()],
                Vec::new(),
                optional_output,
                is_unique,
            );
        };
        let Some(stdout) = child.stdout.take() else {
            return RequestResult::failure(
                vec!["Error: failed to capture child stdout.".to_owned()],
                Vec::new(),
                optional_output,
                is_unique,
            );
        };
        let Some(mut stderr) = child.stderr.take() else {
            return RequestResult::failure(
                vec!["Error: failed to capture child stderr.".to_owned()],
                Vec::new(),
                optional_output,
                is_unique,
            );
        };

        let limit = self.config.max_line_bytes;
        let exchange = async {
            let write = async {
                // Deliver the envelope, then close the pipe so the callee's
                // read-to-EOF completes. Write failures are tolerated: the
                // child may legitimately exit without reading its input.
                let mut bytes = request_line.into_bytes();
                bytes.push(b'\n');
                if let Err(e) = stdin.write_all(&bytes).await {
                    debug!(error = %e, "request channel: stdin write failed, child may have exited");
                } else if let Err(e) = stdin.shutdown().await {
                    debug!(error = %e, "request channel: stdin close failed");
                }
                drop(stdin);
            };
            let read_out = async {
                let mut framed = FramedRead::new(stdout, LineCodec::with_limit(limit));
                let mut lines = Vec::new();
                while let Some(item) = framed.next().await {
                    match item {
                        Ok(line) => lines.push(line),
                        Err(e) => {
                            warn!(error = %e, "request channel: abandoning response stream");
                            break;
                        }
                    }
                }
                lines
            };
            let read_err = async {
                let mut buf = Vec::new();
                if let Err(e) = stderr.read_to_end(&mut buf).await {
                    debug!(error = %e, "request channel: stderr read failed");
                }
                String::from_utf8_lossy(&buf).into_owned()
            };
            let ((), lines, diagnostics, wait_result) =
                tokio::join!(write, read_out, read_err, child.wait());
            (lines, diagnostics, wait_result)
        };

        let deadline = self.config.child_timeout();
        let exchanged = match deadline {
            Some(d) => timeout(d, exchange).await,
            None => Ok(exchange.await),
        };

        let (lines, diagnostics, wait_result) = match exchanged {
            Ok(parts) => parts,
            Err(_elapsed) => {
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "request channel: failed to kill unresponsive child");
                }
                let secs = deadline.map_or(0, |d| d.as_secs());
                warn!(key = %key, secs, "request channel: child unresponsive, killed");
                return RequestResult::failure(
                    vec![format!(
                        "Error: child process unresponsive after {secs}s; the process was killed."
                    )],
                    Vec::new(),
                    optional_output,
                    is_unique,
                );
            }
        };

        let status = match wait_result {
            Ok(status) => status,
            Err(e) => {
                return RequestResult::failure(
                    vec![format!("Error: failed waiting for process: {e}")],
                    Vec::new(),
                    optional_output,
                    is_unique,
                );
            }
        };

        if !status.success() {
            let mut errors = vec![status.code().map_or_else(
                || "Error: process terminated by signal.".to_owned(),
                |code| format!("Error: process exited with code {code}."),
            )];
            let trimmed = diagnostics.trim();
            if !trimmed.is_empty() {
                errors.push(format!("stderr: {trimmed}"));
            }
            warn!(key = %key, ?status, "request channel: target exited with failure");
            return RequestResult::failure(
                errors,
                vec![REMOTE_FAULT_WARNING.to_owned()],
                optional_output,
                is_unique,
            );
        }

        let accepted: Vec<Value> = lines
            .iter()
            .filter_map(|line| aggregate::accept_line(line, &key))
            .collect();
        debug!(
            key = %key,
            captured = lines.len(),
            accepted = accepted.len(),
            "request channel: responses collected"
        );

        aggregate::aggregate(accepted, is_unique, optional_output)
    }
}

impl Default for RequestChannel {
    fn default() -> Self {
        Self::new()
    }
}
