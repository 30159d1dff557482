//! Error types for the VGreen codec and client
//!
//! Every variant carries the offending byte(s) so callers can log or act on a
//! failure without re-deriving context.

use std::ops::RangeInclusive;

use thiserror::Error;

use crate::ack::NackCode;

/// Result type used throughout the crate
pub type VgreenResult<T> = Result<T, VgreenError>;

/// Errors raised while encoding, decoding or exchanging frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VgreenError {
    /// Address is neither broadcast nor an odd value in 0x15..=0xF7
    #[error("Invalid address 0x{address:02X}: expected 0x00 or an odd address in 0x15..=0xF7")]
    InvalidAddress { address: u8 },

    /// Command function code has the error bit set
    #[error("Invalid function code 0x{code:02X}: command codes are 0x00..=0x7F")]
    InvalidFunctionCode { code: u8 },

    /// Function code is not in the catalog
    #[error("Unknown function code 0x{code:02X}")]
    UnknownFunctionCode { code: u8 },

    /// Data payload length does not fit the function
    #[error("Data length {length} out of range for function 0x{function:02X} (allowed {allowed:?})")]
    DataLengthOutOfRange {
        function: u8,
        length: usize,
        allowed: RangeInclusive<usize>,
    },

    /// Frame has the wrong overall length
    #[error("Malformed frame ({} bytes): {reason}", .frame.len())]
    MalformedFrame { frame: Vec<u8>, reason: String },

    /// CRC carried by the frame disagrees with the recomputed value
    #[error("CRC mismatch: calculated 0x{calculated:04X}, received 0x{received:04X}")]
    CrcMismatch { calculated: u16, received: u16 },

    /// Reply came from a different address than the command targeted
    #[error("Address mismatch: expected 0x{expected:02X}, got 0x{received:02X}")]
    AddressMismatch { expected: u8, received: u8 },

    /// Reply answers a different function than the command sent
    #[error("Function mismatch: expected 0x{expected:02X}, got 0x{received:02X}")]
    FunctionMismatch { expected: u8, received: u8 },

    /// Ack byte is neither COMMAND_ACK, REPLY_ACK nor a known NACK code
    #[error("Unknown NACK code 0x{code:02X}")]
    UnknownNackCode { code: u8 },

    /// Read Sensor payload carries a fault byte missing from the fault table
    #[error("Unknown sensor fault code 0x{code:02X}")]
    UnknownSensorFault { code: u8 },

    /// Motor flagged a message error (function MSB set) without a NACK code
    #[error("Message error reply for function 0x{function:02X} with ack 0x{ack:02X}")]
    MessageError { function: u8, ack: u8 },

    /// Motor rejected the command with a NACK
    #[error("NACK for function 0x{function:02X}: {code}")]
    Nack { function: u8, code: NackCode },

    /// No complete reply within the allotted time
    #[error("Timeout: {operation} after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Serial I/O failure
    #[error("IO error: {message}")]
    Io { message: String },

    /// Transport is not connected or could not be opened
    #[error("Connection error: {message}")]
    Connection { message: String },
}

impl VgreenError {
    /// Create a malformed frame error, keeping a copy of the offending bytes
    pub fn malformed(frame: &[u8], reason: impl Into<String>) -> Self {
        VgreenError::MalformedFrame {
            frame: frame.to_vec(),
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        VgreenError::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>) -> Self {
        VgreenError::Io {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        VgreenError::Connection {
            message: message.into(),
        }
    }

    /// Whether resending the same command may succeed.
    ///
    /// Line noise (`CrcMismatch`, `MalformedFrame`) and a silent bus are
    /// retryable. A NACK is retryable only when the motor reports it cannot
    /// execute the command *now*. Unknown codes are table gaps and are never
    /// retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            VgreenError::CrcMismatch { .. }
            | VgreenError::MalformedFrame { .. }
            | VgreenError::Timeout { .. } => true,
            VgreenError::Nack { code, .. } => code.is_retryable(),
            _ => false,
        }
    }

    /// Whether the error was raised while validating a frame on the wire
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            VgreenError::MalformedFrame { .. }
                | VgreenError::CrcMismatch { .. }
                | VgreenError::AddressMismatch { .. }
                | VgreenError::FunctionMismatch { .. }
        )
    }
}

impl From<std::io::Error> for VgreenError {
    fn from(err: std::io::Error) -> Self {
        VgreenError::io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy() {
        assert!(VgreenError::CrcMismatch {
            calculated: 0x1234,
            received: 0x4321
        }
        .is_retryable());
        assert!(VgreenError::malformed(&[0x15, 0x41], "too short").is_retryable());
        assert!(VgreenError::Nack {
            function: 0x41,
            code: NackCode::CannotExecuteNow
        }
        .is_retryable());

        assert!(!VgreenError::Nack {
            function: 0x41,
            code: NackCode::FaultMode
        }
        .is_retryable());
        assert!(!VgreenError::UnknownNackCode { code: 0x99 }.is_retryable());
        assert!(!VgreenError::InvalidAddress { address: 0x16 }.is_retryable());
        assert!(!VgreenError::MessageError {
            function: 0x41,
            ack: 0x10
        }
        .is_retryable());
    }

    #[test]
    fn test_display_carries_offending_bytes() {
        let err = VgreenError::InvalidAddress { address: 0xF8 };
        assert!(err.to_string().contains("0xF8"));

        let err = VgreenError::malformed(&[0x15, 0x43, 0x10, 0x00], "too short");
        assert_eq!(err.to_string(), "Malformed frame (4 bytes): too short");

        let err = VgreenError::Nack {
            function: 0x44,
            code: NackCode::OperandOutOfRange,
        };
        assert!(err.to_string().contains("Operand out of allowed range"));
    }

    #[test]
    fn test_frame_errors() {
        assert!(VgreenError::AddressMismatch {
            expected: 0x15,
            received: 0x17
        }
        .is_frame_error());
        assert!(VgreenError::malformed(&[], "empty").is_frame_error());
        assert!(!VgreenError::timeout("read reply", 10).is_frame_error());
        assert!(!VgreenError::UnknownNackCode { code: 0x99 }.is_frame_error());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "port gone");
        let err: VgreenError = io.into();
        assert!(matches!(err, VgreenError::Io { ref message } if message.contains("port gone")));
    }
}
