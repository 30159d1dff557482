//! Decoded and encoded frames
//!
//! A [`Message`] is built by the codec and never mutated afterwards. The ack
//! byte is kept raw; [`Message::classify`] resolves it on demand, so a frame
//! can decode structurally even when its ack turns out to be unknown.

use std::fmt;

use crate::ack::{self, AckStatus};
use crate::catalog::{self, FunctionDescriptor};
use crate::constants::{COMMAND_ACK, CRC_LEN, ERROR_REPLY_FLAG, FC_READ_SENSOR, HEADER_LEN};
use crate::error::{VgreenError, VgreenResult};
use crate::frame::Frame;
use crate::sensor::{self, SensorFaultCode, SensorReading, FAULT_BYTE_INDEX};

/// Which side of the bus produced the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Sent by the master (ack 0x20)
    Command,
    /// Sent by the motor
    Reply,
}

impl Direction {
    /// Direction implied by an ack byte
    #[inline]
    pub fn from_ack(ack: u8) -> Self {
        if ack == COMMAND_ACK {
            Direction::Command
        } else {
            Direction::Reply
        }
    }
}

/// One frame on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    address: u8,
    function: u8,
    error_reply: bool,
    direction: Direction,
    ack: u8,
    data: Vec<u8>,
    crc: [u8; 2],
}

impl Message {
    /// `function` must already have the error bit stripped
    pub(crate) fn from_parts(
        address: u8,
        function: u8,
        error_reply: bool,
        ack: u8,
        data: &[u8],
        crc: [u8; 2],
    ) -> Self {
        Self {
            address,
            function,
            error_reply,
            direction: Direction::from_ack(ack),
            ack,
            data: data.to_vec(),
            crc,
        }
    }

    /// Bus address
    #[inline]
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Operative function code (0x00..=0x7F)
    #[inline]
    pub fn function(&self) -> u8 {
        self.function
    }

    /// Function byte as sent on the wire, error bit included
    #[inline]
    pub fn function_byte(&self) -> u8 {
        if self.error_reply {
            self.function | ERROR_REPLY_FLAG
        } else {
            self.function
        }
    }

    /// Whether the motor flagged a message error (MSB of the function byte)
    #[inline]
    pub fn is_error_reply(&self) -> bool {
        self.error_reply
    }

    /// Command or reply
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Raw ack byte
    #[inline]
    pub fn ack(&self) -> u8 {
        self.ack
    }

    /// Payload, possibly empty
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// CRC as `[lo, hi]`
    #[inline]
    pub fn crc_bytes(&self) -> [u8; 2] {
        self.crc
    }

    /// CRC value
    #[inline]
    pub fn crc(&self) -> u16 {
        u16::from_le_bytes(self.crc)
    }

    /// Total length on the wire
    #[inline]
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + self.data.len() + CRC_LEN
    }

    /// Catalog entry for the wire function byte
    pub fn descriptor(&self) -> VgreenResult<&'static FunctionDescriptor> {
        catalog::lookup(self.function_byte())
    }

    /// Resolve the ack byte
    pub fn classify(&self) -> VgreenResult<AckStatus> {
        ack::classify(self.ack)
    }

    /// Succeed only for an accepted reply.
    ///
    /// A NACK becomes `VgreenError::Nack`. An error reply without a NACK code
    /// becomes `VgreenError::MessageError`. A command ack seen on a reply is a
    /// malformed frame.
    pub fn check_ack(&self) -> VgreenResult<()> {
        match self.classify()? {
            AckStatus::Nack(code) => Err(VgreenError::Nack {
                function: self.function,
                code,
            }),
            _ if self.error_reply => Err(VgreenError::MessageError {
                function: self.function,
                ack: self.ack,
            }),
            AckStatus::Success => Ok(()),
            AckStatus::Command => Err(VgreenError::malformed(
                &self.to_bytes(),
                "command ack in a reply",
            )),
        }
    }

    /// Read Sensor payload, for Read Sensor replies
    pub fn sensor_reading(&self) -> Option<SensorReading> {
        if self.function != FC_READ_SENSOR
            || self.direction != Direction::Reply
            || self.error_reply
        {
            return None;
        }
        SensorReading::from_payload(&self.data)
    }

    /// Fault reported by a Read Sensor reply.
    ///
    /// Checked independently of the ack byte. Other messages report no fault.
    /// Only meaningful when the command read the fault-reporting sensor; see
    /// [`SensorReading::fault`].
    pub fn sensor_fault(&self) -> VgreenResult<Option<SensorFaultCode>> {
        if self.function != FC_READ_SENSOR
            || self.direction != Direction::Reply
            || self.error_reply
        {
            return Ok(None);
        }
        match self.data.get(FAULT_BYTE_INDEX) {
            Some(&byte) => sensor::resolve_fault(byte),
            None => Ok(None),
        }
    }

    /// Serialize into a stack frame, keeping the carried CRC
    pub fn to_frame(&self) -> VgreenResult<Frame> {
        let mut frame = Frame::new();
        frame.push(self.address)?;
        frame.push(self.function_byte())?;
        frame.push(self.ack)?;
        frame.extend(&self.data)?;
        frame.extend(&self.crc)?;
        Ok(frame)
    }

    /// Serialize into wire bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.wire_len());
        bytes.push(self.address);
        bytes.push(self.function_byte());
        bytes.push(self.ack);
        bytes.extend_from_slice(&self.data);
        bytes.extend_from_slice(&self.crc);
        bytes
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = catalog::lookup(self.function)
            .map(|d| d.name)
            .unwrap_or("Unknown Function");
        write!(
            f,
            "{:?} addr=0x{:02X} fn=0x{:02X} ({}{}) ack=0x{:02X} data={:02X?}",
            self.direction,
            self.address,
            self.function,
            name,
            if self.error_reply { ", error" } else { "" },
            self.ack,
            self.data
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ack::NackCode;
    use crate::crc;

    fn reply(address: u8, function_byte: u8, ack: u8, data: &[u8]) -> Message {
        let mut raw = vec![address, function_byte, ack];
        raw.extend_from_slice(data);
        let crc = crc::compute_bytes(&raw);
        Message::from_parts(
            address,
            function_byte & 0x7F,
            function_byte & 0x80 != 0,
            ack,
            data,
            crc,
        )
    }

    #[test]
    fn test_accessors() {
        let msg = reply(0x15, 0x43, 0x10, &[0x05]);
        assert_eq!(msg.address(), 0x15);
        assert_eq!(msg.function(), 0x43);
        assert_eq!(msg.direction(), Direction::Reply);
        assert_eq!(msg.wire_len(), 6);
        assert_eq!(msg.to_bytes().len(), 6);
        assert_eq!(msg.descriptor().unwrap().name, "Status");
        assert!(msg.check_ack().is_ok());
    }

    #[test]
    fn test_error_reply_keeps_flag_out_of_function() {
        let msg = reply(0x15, 0xC1, 0x02, &[]);
        assert_eq!(msg.function(), 0x41);
        assert_eq!(msg.function_byte(), 0xC1);
        assert!(msg.is_error_reply());
        assert!(msg.descriptor().unwrap().is_message_error());
        assert_eq!(
            msg.check_ack(),
            Err(VgreenError::Nack {
                function: 0x41,
                code: NackCode::OperandOutOfRange
            })
        );
    }

    #[test]
    fn test_error_reply_with_success_ack_is_rejected() {
        let msg = reply(0x15, 0xC3, 0x10, &[0x00]);
        assert_eq!(
            msg.check_ack(),
            Err(VgreenError::MessageError {
                function: 0x43,
                ack: 0x10
            })
        );

        let msg = reply(0x15, 0xC1, 0x20, &[]);
        assert!(matches!(
            msg.check_ack(),
            Err(VgreenError::MessageError { function: 0x41, .. })
        ));
    }

    #[test]
    fn test_command_ack_on_reply_is_rejected() {
        let msg = reply(0x15, 0x41, 0x20, &[]);
        assert_eq!(msg.direction(), Direction::Command);
        assert!(matches!(
            msg.check_ack(),
            Err(VgreenError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn test_sensor_fault_with_success_ack() {
        let msg = reply(0x15, 0x45, 0x10, &[0x00, 0x01, 0x2E, 0x00]);
        assert!(msg.check_ack().is_ok());
        assert_eq!(
            msg.sensor_fault(),
            Ok(Some(SensorFaultCode::IgbtOverTemperature))
        );
        assert_eq!(msg.sensor_reading().unwrap().value, 0x002E);
    }

    #[test]
    fn test_sensor_fault_unknown() {
        let msg = reply(0x15, 0x45, 0x10, &[0x00, 0x01, 0x50, 0x00]);
        assert_eq!(
            msg.sensor_fault(),
            Err(VgreenError::UnknownSensorFault { code: 0x50 })
        );
    }

    #[test]
    fn test_sensor_fault_ignored_elsewhere() {
        let status = reply(0x15, 0x43, 0x10, &[0x22]);
        assert_eq!(status.sensor_fault(), Ok(None));
        assert!(status.sensor_reading().is_none());
    }

    #[test]
    fn test_to_frame_matches_to_bytes() {
        let msg = reply(0x15, 0x44, 0x10, &[0x00, 0xE8, 0x03]);
        assert_eq!(msg.to_frame().unwrap().as_slice(), msg.to_bytes().as_slice());
    }

    #[test]
    fn test_display() {
        let msg = reply(0x15, 0x41, 0x10, &[]);
        assert_eq!(
            msg.to_string(),
            "Reply addr=0x15 fn=0x41 (Go) ack=0x10 data=[]"
        );
    }
}
