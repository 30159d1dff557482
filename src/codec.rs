//! # Frame Codec
//!
//! Encoding of commands into byte-exact frames and decoding of received bytes
//! into validated [`Message`]s.
//!
//! ## Decode order
//!
//! | Step | Check | Error |
//! |------|-------|-------|
//! | 1 | 5..=16 bytes | `MalformedFrame` |
//! | 2 | CRC over address..data | `CrcMismatch` |
//! | 3 | reply address | `AddressMismatch` |
//! | 4 | function known, matches command | `UnknownFunctionCode`, `FunctionMismatch` |
//! | 5 | fixed length for the direction | `MalformedFrame` |
//!
//! The ack byte is not judged here; see [`Message::classify`].

use tracing::debug;

use crate::address;
use crate::catalog::{self, FrameLength};
use crate::constants::{
    COMMAND_ACK, CRC_LEN, ERROR_REPLY_FLAG, FC_CONFIGURATION, FC_GO, FC_READ_IDENTIFICATION,
    FC_READ_SENSOR, FC_SET_DEMAND, FC_STATUS, FC_STOP, FC_STORE_CONFIGURATION, FUNCTION_MASK,
    HEADER_LEN, MAX_DATA_LEN, MAX_FRAME_LEN, MIN_FRAME_LEN,
};
use crate::crc;
use crate::error::{VgreenError, VgreenResult};
use crate::frame::{Frame, FrameBuilder};
use crate::message::{Direction, Message};
use crate::sensor::{SensorReading, SENSOR_REPLY_DATA_LEN};

/// VGreen frame codec.
pub struct VgreenCodec;

// ============================================================================
// Encoding
// ============================================================================

/// Encode a command frame.
///
/// # Example
///
/// ```rust
/// use vgreen_modbus::encode;
///
/// let frame = encode(0x15, 0x41, &[]).unwrap();
/// assert_eq!(frame, vec![0x15, 0x41, 0x20, 0x51, 0x8C]);
/// ```
pub fn encode(address: u8, function: u8, data: &[u8]) -> VgreenResult<Vec<u8>> {
    Ok(VgreenCodec::build_command(address, function, data)?.to_bytes())
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a received frame.
///
/// `expected_address` and `expected_function` are those of the command the
/// frame answers. A broadcast `expected_address` (0) accepts any valid unicast
/// address. The error bit of `expected_function` is ignored.
pub fn decode(raw: &[u8], expected_address: u8, expected_function: u8) -> VgreenResult<Message> {
    if raw.len() < MIN_FRAME_LEN {
        return Err(VgreenError::malformed(
            raw,
            format!("shorter than the {}-byte minimum", MIN_FRAME_LEN),
        ));
    }
    if raw.len() > MAX_FRAME_LEN {
        return Err(VgreenError::malformed(
            raw,
            format!("longer than the {}-byte maximum", MAX_FRAME_LEN),
        ));
    }

    let frame = Frame::from_slice(raw)?;
    let split = raw.len() - CRC_LEN;
    let crc_bytes = [raw[split], raw[split + 1]];
    let received = u16::from_le_bytes(crc_bytes);
    let calculated = crc::compute(&raw[..split]);
    if received != calculated {
        debug!(
            "CRC mismatch on {:02X?}: calculated {:04X}, received {:04X}",
            raw, calculated, received
        );
        return Err(VgreenError::CrcMismatch {
            calculated,
            received,
        });
    }

    let addr = raw[0];
    let function_byte = raw[1];
    let ack = raw[2];

    address::check_reply(expected_address, addr)?;

    let error_reply = function_byte & ERROR_REPLY_FLAG != 0;
    let function = function_byte & FUNCTION_MASK;
    let descriptor = catalog::lookup(function_byte)?;

    let expected_base = expected_function & FUNCTION_MASK;
    if function != expected_base {
        return Err(VgreenError::FunctionMismatch {
            expected: expected_base,
            received: function,
        });
    }

    let direction = Direction::from_ack(ack);
    let expected_len = match direction {
        Direction::Command => descriptor.command_length.unwrap_or(FrameLength::Variable),
        Direction::Reply => descriptor.reply_length,
    };
    if let Some(len) = expected_len.fixed() {
        if raw.len() != len {
            return Err(VgreenError::malformed(
                raw,
                format!(
                    "{} {:?} must be {} bytes",
                    descriptor.name, direction, len
                ),
            ));
        }
    }

    let message = Message::from_parts(addr, function, error_reply, ack, frame.payload(), crc_bytes);
    debug!("Frame decoded: {}", message);
    Ok(message)
}

// ============================================================================
// Reply Parsing
// ============================================================================

fn expect_reply(message: &Message, function: u8, data_len: usize) -> VgreenResult<()> {
    message.check_ack()?;
    if message.function() != function {
        return Err(VgreenError::FunctionMismatch {
            expected: function,
            received: message.function(),
        });
    }
    if message.data().len() != data_len {
        return Err(VgreenError::malformed(
            &message.to_bytes(),
            format!("expected {} data bytes", data_len),
        ));
    }
    Ok(())
}

/// Status byte of an accepted Status reply.
pub fn parse_status_reply(message: &Message) -> VgreenResult<u8> {
    expect_reply(message, FC_STATUS, 1)?;
    Ok(message.data()[0])
}

/// Demand mode and value echoed by an accepted Set Demand reply.
pub fn parse_demand_reply(message: &Message) -> VgreenResult<(u8, u16)> {
    expect_reply(message, FC_SET_DEMAND, 3)?;
    let data = message.data();
    Ok((data[0], u16::from_le_bytes([data[1], data[2]])))
}

/// Reading carried by an accepted Read Sensor reply.
///
/// The fault byte is not resolved here; use [`Message::sensor_fault`] or
/// [`SensorReading::fault`].
pub fn parse_sensor_reply(message: &Message) -> VgreenResult<SensorReading> {
    expect_reply(message, FC_READ_SENSOR, SENSOR_REPLY_DATA_LEN)?;
    SensorReading::from_payload(message.data())
        .ok_or_else(|| VgreenError::malformed(&message.to_bytes(), "bad Read Sensor payload"))
}

// ============================================================================
// Command Building
// ============================================================================

impl VgreenCodec {
    /// Validate and assemble a command message.
    ///
    /// Fails with `InvalidAddress`, `InvalidFunctionCode`,
    /// `UnknownFunctionCode` or `DataLengthOutOfRange`.
    pub fn build_command(address: u8, function: u8, data: &[u8]) -> VgreenResult<Message> {
        address::validate(address)?;
        let descriptor = catalog::lookup_command(function)?;

        if data.len() > MAX_DATA_LEN {
            return Err(VgreenError::DataLengthOutOfRange {
                function,
                length: data.len(),
                allowed: 0..=MAX_DATA_LEN,
            });
        }
        if let Some(FrameLength::Fixed(len)) = descriptor.command_length {
            let expected = len - HEADER_LEN - CRC_LEN;
            if data.len() != expected {
                return Err(VgreenError::DataLengthOutOfRange {
                    function,
                    length: data.len(),
                    allowed: expected..=expected,
                });
            }
        }

        let frame = FrameBuilder::new()
            .address(address)?
            .function_code(function)?
            .ack(COMMAND_ACK)?
            .data(data)?
            .build()?;
        let crc = frame
            .crc_bytes()
            .ok_or_else(|| VgreenError::malformed(frame.as_slice(), "missing CRC"))?;

        Ok(Message::from_parts(
            address,
            function,
            false,
            COMMAND_ACK,
            data,
            crc,
        ))
    }

    /// Go: start the motor at the current demand.
    pub fn build_go(address: u8) -> VgreenResult<Message> {
        Self::build_command(address, FC_GO, &[])
    }

    /// Stop the motor.
    pub fn build_stop(address: u8) -> VgreenResult<Message> {
        Self::build_command(address, FC_STOP, &[])
    }

    /// Query the motor status byte.
    pub fn build_status(address: u8) -> VgreenResult<Message> {
        Self::build_command(address, FC_STATUS, &[])
    }

    /// Set Demand: `[mode, demand lo, demand hi]`.
    pub fn build_set_demand(address: u8, mode: u8, demand: u16) -> VgreenResult<Message> {
        let [lo, hi] = demand.to_le_bytes();
        Self::build_command(address, FC_SET_DEMAND, &[mode, lo, hi])
    }

    /// Read Sensor: `[page, sensor]`.
    pub fn build_read_sensor(address: u8, page: u8, sensor: u8) -> VgreenResult<Message> {
        Self::build_command(address, FC_READ_SENSOR, &[page, sensor])
    }

    /// Read Identification with a caller-supplied selector payload.
    pub fn build_read_identification(address: u8, data: &[u8]) -> VgreenResult<Message> {
        Self::build_command(address, FC_READ_IDENTIFICATION, data)
    }

    /// Configuration Read/Write; the block layout belongs to the caller.
    pub fn build_configuration(address: u8, data: &[u8]) -> VgreenResult<Message> {
        Self::build_command(address, FC_CONFIGURATION, data)
    }

    /// Persist the configuration. The motor needs up to a second to reply.
    pub fn build_store_configuration(address: u8) -> VgreenResult<Message> {
        Self::build_command(address, FC_STORE_CONFIGURATION, &[])
    }
}

// ============================================================================
// Tests
// ============================================================================
