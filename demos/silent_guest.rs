//! Demo guest: reads the request and exits without emitting anything.

use crosscall::guest::ResponseChannel;

fn main() {
    let mut channel = ResponseChannel::open();
    channel.close();
}
