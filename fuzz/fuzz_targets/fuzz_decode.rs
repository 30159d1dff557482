//! Fuzz target for frame decoding.
//!
//! Tests:
//! - Arbitrary bytes never panic the decoder
//! - Any frame that decodes re-serializes to the same bytes
//! - Ack and sensor fault resolution on decoded frames

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vgreen_modbus::decode;

#[derive(Debug, Arbitrary)]
struct DecodeInput {
    expected_address: u8,
    expected_function: u8,
    raw: Vec<u8>,
}

fuzz_target!(|input: DecodeInput| {
    if let Ok(message) = decode(&input.raw, input.expected_address, input.expected_function) {
        assert_eq!(message.to_bytes(), input.raw);
        assert_eq!(message.wire_len(), input.raw.len());
        let _ = message.classify();
        let _ = message.sensor_fault();
    }
});
