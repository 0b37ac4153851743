//! Random-input fuzzer for round payload decoding
//!
//! Any byte string must either decode to a choice whose encoding is exactly
//! the input, or be rejected with a `ProtocolError`. Never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use skirmish_proto::{Choice, MAX_PAYLOAD_SIZE};

fuzz_target!(|data: &[u8]| {
    match Choice::decode(data) {
        Ok(choice) => assert_eq!(&choice.encode()[..], data),
        Err(_) => assert!(
            data.is_empty()
                || data.len() > MAX_PAYLOAD_SIZE
                || Choice::ALL.iter().all(|c| c.as_token().as_bytes() != data)
        ),
    }
});
