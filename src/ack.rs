//! Ack byte classification and the NACK code table
//!
//! The third byte of every frame is 0x20 on commands, 0x10 on a successful
//! reply, and otherwise a NACK code: the motor received a valid command and
//! data block but could not process it.

use std::fmt;

use crate::constants::{COMMAND_ACK, REPLY_ACK};
use crate::error::{VgreenError, VgreenResult};

/// NACK codes returned in the ack byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NackCode {
    /// Command not recognized / illegal
    IllegalCommand = 0x01,
    /// Operand out of allowed range
    OperandOutOfRange = 0x02,
    /// Data out of range
    DataOutOfRange = 0x03,
    /// General failure: fault mode
    FaultMode = 0x04,
    /// Incorrect command length
    IncorrectLength = 0x05,
    /// Command cannot be executed now
    CannotExecuteNow = 0x06,
    /// Buffer error (not used)
    BufferError = 0x09,
    /// Running parameters incomplete (not used)
    ParametersIncomplete = 0x0A,
}

impl NackCode {
    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(NackCode::IllegalCommand),
            0x02 => Some(NackCode::OperandOutOfRange),
            0x03 => Some(NackCode::DataOutOfRange),
            0x04 => Some(NackCode::FaultMode),
            0x05 => Some(NackCode::IncorrectLength),
            0x06 => Some(NackCode::CannotExecuteNow),
            0x09 => Some(NackCode::BufferError),
            0x0A => Some(NackCode::ParametersIncomplete),
            _ => None,
        }
    }

    /// Convert to u8
    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Description as worded in the protocol document
    pub fn description(self) -> &'static str {
        match self {
            NackCode::IllegalCommand => "Command not recognized / illegal",
            NackCode::OperandOutOfRange => "Operand out of allowed range",
            NackCode::DataOutOfRange => "Data out of range",
            NackCode::FaultMode => "General failure: fault mode",
            NackCode::IncorrectLength => "Incorrect command length",
            NackCode::CannotExecuteNow => "Command cannot be executed now",
            NackCode::BufferError => "Buffer error (not used)",
            NackCode::ParametersIncomplete => "Running parameters incomplete (not used)",
        }
    }

    /// Only a busy motor is worth asking again; the rest need a different
    /// command or operator intervention.
    #[inline]
    pub fn is_retryable(self) -> bool {
        matches!(self, NackCode::CannotExecuteNow)
    }
}

impl fmt::Display for NackCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.description(), self.to_u8())
    }
}

/// Outcome of classifying an ack byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    /// 0x20: frame is a command from the master
    Command,
    /// 0x10: motor accepted the command
    Success,
    /// Motor rejected the command
    Nack(NackCode),
}

impl AckStatus {
    /// Whether the motor accepted the command
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, AckStatus::Success)
    }

    /// NACK description, if any
    pub fn description(self) -> Option<&'static str> {
        match self {
            AckStatus::Nack(code) => Some(code.description()),
            _ => None,
        }
    }
}

/// Classify an ack byte.
///
/// Fails with `UnknownNackCode` for a byte that is neither an ack nor in the
/// NACK table.
pub fn classify(ack: u8) -> VgreenResult<AckStatus> {
    match ack {
        COMMAND_ACK => Ok(AckStatus::Command),
        REPLY_ACK => Ok(AckStatus::Success),
        code => NackCode::from_u8(code)
            .map(AckStatus::Nack)
            .ok_or(VgreenError::UnknownNackCode { code }),
    }
}
