//! Demo guest: responds to a numeric request with its double.

use crosscall::bundle;
use crosscall::guest::ResponseChannel;

fn main() {
    let mut channel = ResponseChannel::open();
    let doubled = channel.data_int() * 2;
    channel.emit(&bundle(&doubled));
    channel.close();
}
