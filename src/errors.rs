//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

use crate::resolve::ResolveError;

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Crate error enumeration covering all domain failure modes.
///
/// Protocol-level failures that belong to one exchange (validation, remote
/// exit codes, cardinality violations) are carried as data inside
/// [`RequestResult`](crate::channel::RequestResult) rather than raised here;
/// this enum covers the conditions that have no exchange to attach to.
#[derive(Debug)]
pub enum ExchangeError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Target validation failure surfaced outside an exchange.
    Resolve(String),
    /// Wire-framing failure on the response stream.
    Protocol(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for ExchangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Resolve(msg) => write!(f, "resolve: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for ExchangeError {}

impl From<toml::de::Error> for ExchangeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for ExchangeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<ResolveError> for ExchangeError {
    fn from(err: ResolveError) -> Self {
        Self::Resolve(err.to_string())
    }
}
