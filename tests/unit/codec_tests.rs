//! Unit tests for the NDJSON line codec.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crosscall::channel::codec::{LineCodec, DEFAULT_MAX_LINE_BYTES};
use crosscall::ExchangeError;

/// A complete newline-terminated line decodes to its content.
#[test]
fn complete_line_decodes() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::from("{\"key\":null}\n");
    let decoded = codec.decode(&mut buf).expect("decode must succeed");
    assert_eq!(decoded, Some("{\"key\":null}".to_owned()));
}

/// Two lines in one buffer decode as two items.
#[test]
fn batched_lines_decode_separately() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::from("first\nsecond\n");
    assert_eq!(
        codec.decode(&mut buf).expect("first decode"),
        Some("first".to_owned())
    );
    assert_eq!(
        codec.decode(&mut buf).expect("second decode"),
        Some("second".to_owned())
    );
    assert_eq!(codec.decode(&mut buf).expect("empty decode"), None);
}

/// A partial line buffers until its newline arrives.
#[test]
fn partial_line_buffers_until_newline() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::from("{\"key\":");
    assert_eq!(codec.decode(&mut buf).expect("partial decode"), None);

    buf.extend_from_slice(b"null}\n");
    assert_eq!(
        codec.decode(&mut buf).expect("completed decode"),
        Some("{\"key\":null}".to_owned())
    );
}

/// A final unterminated line is yielded at EOF.
#[test]
fn unterminated_final_line_decodes_at_eof() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::from("tail-without-newline");
    assert_eq!(codec.decode(&mut buf).expect("no full line yet"), None);
    assert_eq!(
        codec.decode_eof(&mut buf).expect("eof decode"),
        Some("tail-without-newline".to_owned())
    );
}

/// A line beyond the configured limit yields the protocol error instead of
/// allocating without bound.
#[test]
fn oversized_line_is_rejected() {
    let mut codec = LineCodec::with_limit(64);
    let big = "a".repeat(65) + "\n";
    let mut buf = BytesMut::from(big.as_str());
    match codec.decode(&mut buf) {
        Err(ExchangeError::Protocol(msg)) => {
            assert!(msg.contains("line too long"), "got: {msg}");
        }
        other => panic!("expected Protocol(\"line too long …\"), got: {other:?}"),
    }
}

/// The default limit matches the documented constant.
#[test]
fn default_limit_accepts_large_but_bounded_lines() {
    assert_eq!(DEFAULT_MAX_LINE_BYTES, 1_048_576);
    let mut codec = LineCodec::new();
    let line = "b".repeat(1000) + "\n";
    let mut buf = BytesMut::from(line.as_str());
    assert!(codec.decode(&mut buf).expect("decode").is_some());
}
