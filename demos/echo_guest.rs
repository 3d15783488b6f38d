//! Demo guest: echoes the request payload back unchanged.

use crosscall::bundle;
use crosscall::guest::ResponseChannel;

fn main() {
    let mut channel = ResponseChannel::open();
    let payload = bundle(channel.data());
    channel.emit(&payload);
    channel.close();
}
