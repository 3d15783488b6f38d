#![forbid(unsafe_code)]

//! Cross-language JSON exchange between sibling processes over stdio.
//!
//! One process (the caller) sends exactly one JSON request to a program
//! written in another language and receives zero or more JSON responses,
//! correlated by a random 128-bit key. The caller side lives in
//! [`channel::RequestChannel`]; programs on the receiving end embed
//! [`guest::ResponseChannel`].

pub mod channel;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod guest;
pub mod key;
pub mod resolve;

pub use channel::{RequestChannel, RequestResult};
pub use config::ExchangeConfig;
pub use envelope::{bundle, RequestEnvelope, ResponseEnvelope};
pub use errors::{ExchangeError, Result};
pub use guest::ResponseChannel;
pub use key::CorrelationKey;
pub use resolve::{Command, ResolveError, Resolver};
