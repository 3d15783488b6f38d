//! Exchange configuration parsing and defaults.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::channel::codec::DEFAULT_MAX_LINE_BYTES;
use crate::Result;

fn default_max_line_bytes() -> usize {
    DEFAULT_MAX_LINE_BYTES
}

/// Tunable settings for a [`RequestChannel`](crate::channel::RequestChannel).
///
/// All fields have defaults, so an empty TOML document is a valid
/// configuration. Loaded via [`ExchangeConfig::from_toml_str`] or built in
/// code through [`ExchangeConfig::default`] and field assignment.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ExchangeConfig {
    /// Deadline for the spawned child, in seconds; 0 means no deadline.
    ///
    /// When the deadline expires the child is killed and the exchange is
    /// reported failed with the child-unresponsive error kind.
    #[serde(default)]
    pub child_timeout_seconds: u64,
    /// Maximum accepted length of one response line, in bytes.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
    /// Interpreter overrides keyed by language identifier,
    /// e.g. `python = "python3"`.
    #[serde(default)]
    pub interpreters: HashMap<String, String>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            child_timeout_seconds: 0,
            max_line_bytes: default_max_line_bytes(),
            interpreters: HashMap::new(),
        }
    }
}

impl ExchangeConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`ExchangeError::Config`](crate::ExchangeError::Config) when the text
    /// is not valid TOML or a field has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The child deadline as a [`Duration`], or `None` when unbounded.
    #[must_use]
    pub fn child_timeout(&self) -> Option<Duration> {
        (self.child_timeout_seconds > 0).then(|| Duration::from_secs(self.child_timeout_seconds))
    }
}
