//! Fuzz target: `frame::decode` and `Receiver::validate`
//!
//! Feeds arbitrary reads into the heartbeat receiver and asserts that it
//! never panics, accepts only whole one-byte frames on its own id, and
//! counts every read exactly once.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use canpingpong::app::receiver::Receiver;
use canpingpong::frame::{self, DEFAULT_IDENTIFIER, WIRE_FRAME_SIZE};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let decoded = frame::decode(data);
    assert_eq!(decoded.is_ok(), data.len() == WIRE_FRAME_SIZE);

    let mut rx = Receiver::new(DEFAULT_IDENTIFIER);
    if let Ok(Some(counter)) = rx.validate(data) {
        let f = decoded.expect("accepted frames decode");
        assert_eq!(f.identifier, DEFAULT_IDENTIFIER);
        assert_eq!(f.length, 1);
        assert_eq!(f.payload[0], counter);
    }
    let c = rx.counts();
    assert_eq!(c.accepted + c.foreign + c.malformed, 1);
});
