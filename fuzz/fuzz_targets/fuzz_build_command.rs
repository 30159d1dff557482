//! Fuzz target for command encoding.
//!
//! Tests:
//! - Arbitrary address, function and payload never panic the encoder
//! - Every encoded command decodes back to itself

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vgreen_modbus::{decode, encode, MAX_FRAME_LEN};

#[derive(Debug, Arbitrary)]
struct CommandInput {
    address: u8,
    function: u8,
    data: Vec<u8>,
}

fuzz_target!(|input: CommandInput| {
    if let Ok(frame) = encode(input.address, input.function, &input.data) {
        assert!(frame.len() <= MAX_FRAME_LEN);
        let message = decode(&frame, input.address, input.function)
            .expect("encoded command must decode");
        assert_eq!(message.data(), input.data.as_slice());
    }
});
