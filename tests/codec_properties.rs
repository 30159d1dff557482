//! Property tests for the frame codec.

use proptest::prelude::*;
use vgreen_modbus::address;
use vgreen_modbus::catalog::{self, FrameLength};
use vgreen_modbus::crc;
use vgreen_modbus::{decode, encode, Direction, VgreenError, MAX_DATA_LEN};

fn valid_address() -> impl Strategy<Value = u8> {
    prop_oneof![Just(0u8), (0x0Au8..=0x7B).prop_map(|n| n * 2 + 1)]
}

/// A registered function code with a payload of acceptable length
fn command_parts() -> impl Strategy<Value = (u8, Vec<u8>)> {
    let functions: Vec<(u8, Option<usize>)> = catalog::all()
        .map(|d| {
            let data_len = match d.command_length {
                Some(FrameLength::Fixed(len)) => Some(len - 5),
                _ => None,
            };
            (d.code, data_len)
        })
        .collect();

    proptest::sample::select(functions).prop_flat_map(|(code, data_len)| {
        let data = match data_len {
            Some(len) => proptest::collection::vec(any::<u8>(), len..=len),
            None => proptest::collection::vec(any::<u8>(), 0..=MAX_DATA_LEN),
        };
        (Just(code), data)
    })
}

proptest! {
    #[test]
    fn encoded_commands_decode_to_themselves(
        address in valid_address(),
        (function, data) in command_parts(),
    ) {
        let frame = encode(address, function, &data).unwrap();
        prop_assert_eq!(frame.len(), 5 + data.len());
        prop_assert!(crc::verify(&frame));

        let message = decode(&frame, address, function).unwrap();
        prop_assert_eq!(message.address(), address);
        prop_assert_eq!(message.function(), function);
        prop_assert_eq!(message.direction(), Direction::Command);
        prop_assert_eq!(message.data(), data.as_slice());
        prop_assert_eq!(message.to_bytes(), frame);
    }

    #[test]
    fn corrupted_byte_fails_crc(
        address in valid_address(),
        (function, data) in command_parts(),
        index in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let mut frame = encode(address, function, &data).unwrap();
        let i = index.index(frame.len());
        frame[i] ^= mask;

        let result = decode(&frame, address, function);
        prop_assert!(
            matches!(result, Err(VgreenError::CrcMismatch { .. })),
            "byte {} ^ 0x{:02X} gave {:?}",
            i,
            mask,
            result
        );
    }

    #[test]
    fn encode_accepts_exactly_the_valid_addresses(address in any::<u8>()) {
        let result = encode(address, 0x41, &[]);
        prop_assert_eq!(result.is_ok(), address::is_valid(address));
        if !address::is_valid(address) {
            prop_assert_eq!(result, Err(VgreenError::InvalidAddress { address }));
        }
    }

    #[test]
    fn crc_appended_frame_verifies(data in proptest::collection::vec(any::<u8>(), 0..32)) {
        let crc_bytes = crc::compute_bytes(&data);
        prop_assert_eq!(crc::compute(&data), crc::compute(&data));

        let mut frame = data.clone();
        frame.extend_from_slice(&crc_bytes);
        prop_assert!(crc::verify(&frame));
    }

    #[test]
    fn decode_never_panics(
        raw in proptest::collection::vec(any::<u8>(), 0..24),
        expected_address in any::<u8>(),
        expected_function in any::<u8>(),
    ) {
        if let Ok(message) = decode(&raw, expected_address, expected_function) {
            prop_assert_eq!(message.to_bytes(), raw);
        }
    }

    #[test]
    fn oversized_payload_is_rejected(
        address in valid_address(),
        data in proptest::collection::vec(any::<u8>(), (MAX_DATA_LEN + 1)..32),
    ) {
        let result = encode(address, 0x46, &data);
        let is_length_error = matches!(result, Err(VgreenError::DataLengthOutOfRange { .. }));
        prop_assert!(is_length_error);
    }
}
