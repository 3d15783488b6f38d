//! Demo guest: prints freely to stdout around its emit, including a forged
//! protocol line carrying the real correlation key. None of the chatter may
//! reach the caller; the suppressed stream swallows it. If suppression ever
//! broke, the forged line would be accepted and trip the caller's
//! cardinality check.

use crosscall::bundle;
use crosscall::guest::ResponseChannel;

fn main() {
    let mut channel = ResponseChannel::open();
    println!("this line must never reach the caller");

    let key = channel.request_key().to_owned();
    println!(
        "{{\"key\":\"{key}\",\"request_status\":true,\"data\":999,\
         \"optionalOutput\":false,\"isUnique\":true,\"errors\":[],\"warnings\":[]}}"
    );

    let value = channel.data_int() + 1;
    channel.emit(&bundle(&value));
    println!("post-emit chatter");
    channel.close();
}
