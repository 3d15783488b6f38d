//! NDJSON codec for the captured response stream.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a configurable maximum line
//! length so an unterminated or runaway line from a misbehaving callee cannot
//! exhaust memory. Used as the codec parameter of
//! [`tokio_util::codec::FramedRead`] over the child's stdout.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

use crate::{ExchangeError, Result};

/// Default per-line limit: 1 MiB.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1_048_576;

/// Newline-delimited framing for the response stream.
///
/// Each `\n`-terminated UTF-8 string is one candidate response line. Lines
/// longer than the configured limit yield
/// [`ExchangeError::Protocol`]`("line too long: …")` instead of allocating.
#[derive(Debug)]
pub struct LineCodec {
    inner: LinesCodec,
    limit: usize,
}

impl LineCodec {
    /// Create a codec with the [`DEFAULT_MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_LINE_BYTES)
    }

    /// Create a codec with a caller-chosen per-line limit.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(limit),
            limit,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ExchangeError;

    /// Decode the next complete line from `src`, buffering partial lines.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.inner.decode(src).map_err(|e| map_codec_error(e, self.limit))
    }

    /// Decode the final unterminated line when the stream reaches EOF.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.inner
            .decode_eof(src)
            .map_err(|e| map_codec_error(e, self.limit))
    }
}

/// Map a [`LinesCodecError`] to the crate error.
fn map_codec_error(e: LinesCodecError, limit: usize) -> ExchangeError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            ExchangeError::Protocol(format!("line too long: exceeded {limit} bytes"))
        }
        LinesCodecError::Io(io_err) => ExchangeError::Io(io_err.to_string()),
    }
}
