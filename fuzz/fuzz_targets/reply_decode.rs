#![no_main]

use keyagent::codec::{JsonCodec, MessageCodec};
use libfuzzer_sys::fuzz_target;

// Fuzz reply decoding with arbitrary bytes
//
// Decoding must never panic; whatever decodes must encode and decode back to
// the same reply.
fuzz_target!(|data: &[u8]| {
    if let Ok(reply) = JsonCodec.decode_reply(data) {
        let bytes = JsonCodec.encode_reply(&reply).unwrap();
        assert_eq!(JsonCodec.decode_reply(&bytes).unwrap(), reply);
    }
});
