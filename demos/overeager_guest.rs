//! Demo guest: emits twice regardless of the request's cardinality flags,
//! to exercise the caller's violation reporting.

use crosscall::guest::ResponseChannel;

fn main() {
    let mut channel = ResponseChannel::open();
    channel.emit("1");
    channel.emit("2");
    channel.close();
}
