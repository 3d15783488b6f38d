//! Demo guest: emits three numbered responses, for `isUnique: false` callers.

use crosscall::guest::ResponseChannel;

fn main() {
    let mut channel = ResponseChannel::open();
    for n in 1..=3 {
        channel.emit(&n.to_string());
    }
    channel.close();
}
