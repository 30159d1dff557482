//! Function code catalog
//!
//! Static registry describing every operation the motor understands, with the
//! expected total wire length of its command and reply frames.
//!
//! | Code | Function | Command | Reply |
//! |------|----------|---------|-------|
//! | 0x41 | Go | 5 | 5 |
//! | 0x42 | Stop | 5 | 5 |
//! | 0x43 | Status | 5 | 6 |
//! | 0x44 | Set Demand | 8 | 8 |
//! | 0x45 | Read Sensor | 7 | 9 |
//! | 0x46 | Read Identification | var | var |
//! | 0x64 | Configuration Read/Write | var | var |
//! | 0x65 | Store Configuration | 5 | 5 |
//! | code \| 0x80 | Message Error | - | var |
//!
//! Message-error codes are never stored: `lookup` derives them from the base
//! table, so every registered code has exactly one error variant.

use std::fmt;

use crate::constants::{
    ERROR_REPLY_FLAG, FC_CONFIGURATION, FC_GO, FC_READ_IDENTIFICATION, FC_READ_SENSOR,
    FC_SET_DEMAND, FC_STATUS, FC_STOP, FC_STORE_CONFIGURATION, FUNCTION_MASK,
};
use crate::error::{VgreenError, VgreenResult};

/// Expected total length of a frame, header and CRC included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameLength {
    /// Always exactly this many bytes
    Fixed(usize),
    /// Length depends on the payload
    Variable,
}

impl FrameLength {
    /// Fixed byte count, if any
    #[inline]
    pub fn fixed(self) -> Option<usize> {
        match self {
            FrameLength::Fixed(len) => Some(len),
            FrameLength::Variable => None,
        }
    }
}

impl fmt::Display for FrameLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameLength::Fixed(len) => write!(f, "{}", len),
            FrameLength::Variable => write!(f, "var"),
        }
    }
}

/// Immutable description of one function code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionDescriptor {
    /// Operative function code (0x00..=0x7F); 0x80 for the shared error entry
    pub code: u8,
    /// Human-readable name
    pub name: &'static str,
    /// Length of a command frame; `None` when the master never sends it
    pub command_length: Option<FrameLength>,
    /// Length of the matching reply frame
    pub reply_length: FrameLength,
}

impl FunctionDescriptor {
    /// Whether this is the shared Message Error entry
    #[inline]
    pub fn is_message_error(&self) -> bool {
        self.code == ERROR_REPLY_FLAG
    }
}

/// Shared descriptor answered for every `code | 0x80`.
///
/// The reply length is variable: a NACK may or may not carry a payload.
pub static MESSAGE_ERROR: FunctionDescriptor = FunctionDescriptor {
    code: ERROR_REPLY_FLAG,
    name: "Message Error",
    command_length: None,
    reply_length: FrameLength::Variable,
};

static FUNCTIONS: [FunctionDescriptor; 8] = [
    FunctionDescriptor {
        code: FC_GO,
        name: "Go",
        command_length: Some(FrameLength::Fixed(5)),
        reply_length: FrameLength::Fixed(5),
    },
    FunctionDescriptor {
        code: FC_STOP,
        name: "Stop",
        command_length: Some(FrameLength::Fixed(5)),
        reply_length: FrameLength::Fixed(5),
    },
    FunctionDescriptor {
        code: FC_STATUS,
        name: "Status",
        command_length: Some(FrameLength::Fixed(5)),
        reply_length: FrameLength::Fixed(6),
    },
    FunctionDescriptor {
        code: FC_SET_DEMAND,
        name: "Set Demand",
        command_length: Some(FrameLength::Fixed(8)),
        reply_length: FrameLength::Fixed(8),
    },
    FunctionDescriptor {
        code: FC_READ_SENSOR,
        name: "Read Sensor",
        command_length: Some(FrameLength::Fixed(7)),
        reply_length: FrameLength::Fixed(9),
    },
    FunctionDescriptor {
        code: FC_READ_IDENTIFICATION,
        name: "Read Identification",
        command_length: Some(FrameLength::Variable),
        reply_length: FrameLength::Variable,
    },
    FunctionDescriptor {
        code: FC_CONFIGURATION,
        name: "Configuration Read/Write",
        command_length: Some(FrameLength::Variable),
        reply_length: FrameLength::Variable,
    },
    FunctionDescriptor {
        code: FC_STORE_CONFIGURATION,
        name: "Store Configuration",
        command_length: Some(FrameLength::Fixed(5)),
        reply_length: FrameLength::Fixed(5),
    },
];

fn find(code: u8) -> Option<&'static FunctionDescriptor> {
    FUNCTIONS.iter().find(|d| d.code == code)
}

/// Resolve a function code as it appears on the wire.
///
/// `code | 0x80` of a registered code resolves to [`MESSAGE_ERROR`].
/// Anything else not in the table fails with `UnknownFunctionCode`.
pub fn lookup(code: u8) -> VgreenResult<&'static FunctionDescriptor> {
    if code & ERROR_REPLY_FLAG != 0 {
        return match find(code & FUNCTION_MASK) {
            Some(_) => Ok(&MESSAGE_ERROR),
            None => Err(VgreenError::UnknownFunctionCode { code }),
        };
    }
    find(code).ok_or(VgreenError::UnknownFunctionCode { code })
}

/// Resolve a function code a master is about to send.
///
/// Codes above 0x7F are rejected outright with `InvalidFunctionCode`; the
/// error bit belongs to the motor.
pub fn lookup_command(code: u8) -> VgreenResult<&'static FunctionDescriptor> {
    if code > FUNCTION_MASK {
        return Err(VgreenError::InvalidFunctionCode { code });
    }
    lookup(code)
}

/// All registered functions, in code order
pub fn all() -> impl Iterator<Item = &'static FunctionDescriptor> {
    FUNCTIONS.iter()
}

/// Operations understood by the motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VgreenFunction {
    /// Go (0x41)
    Go = 0x41,
    /// Stop (0x42)
    Stop = 0x42,
    /// Status (0x43)
    Status = 0x43,
    /// Set Demand (0x44)
    SetDemand = 0x44,
    /// Read Sensor (0x45)
    ReadSensor = 0x45,
    /// Read Identification (0x46)
    ReadIdentification = 0x46,
    /// Configuration Read/Write (0x64)
    Configuration = 0x64,
    /// Store Configuration (0x65)
    StoreConfiguration = 0x65,
}

impl VgreenFunction {
    /// Convert from u8, ignoring the error bit
    pub fn from_u8(value: u8) -> VgreenResult<Self> {
        match value & FUNCTION_MASK {
            FC_GO => Ok(VgreenFunction::Go),
            FC_STOP => Ok(VgreenFunction::Stop),
            FC_STATUS => Ok(VgreenFunction::Status),
            FC_SET_DEMAND => Ok(VgreenFunction::SetDemand),
            FC_READ_SENSOR => Ok(VgreenFunction::ReadSensor),
            FC_READ_IDENTIFICATION => Ok(VgreenFunction::ReadIdentification),
            FC_CONFIGURATION => Ok(VgreenFunction::Configuration),
            FC_STORE_CONFIGURATION => Ok(VgreenFunction::StoreConfiguration),
            _ => Err(VgreenError::UnknownFunctionCode { code: value }),
        }
    }

    /// Convert to u8
    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Catalog entry for this function
    pub fn descriptor(self) -> &'static FunctionDescriptor {
        // Every variant has a table row; see test_every_variant_registered
        find(self.to_u8()).unwrap_or(&MESSAGE_ERROR)
    }
}

impl fmt::Display for VgreenFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.descriptor().name, self.to_u8())
    }
}

impl From<VgreenFunction> for u8 {
    fn from(function: VgreenFunction) -> Self {
        function.to_u8()
    }
}
