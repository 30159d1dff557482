//! VGreen bus protocol constants
//!
//! Frame layout (every field one byte unless noted):
//!
//! ```text
//! [idle ≥ 3.5 chars] [Address] [Function] [Ack] [Data 0..=11] [CRC lo] [CRC hi] [idle ≥ 3.5 chars]
//! ```
//!
//! Frames carry no start/stop markers; the bus idle time delimits them.

// ============================================================================
// Frame Size Constants
// ============================================================================

/// Address + Function + Ack
pub const HEADER_LEN: usize = 3;

/// CRC-16, low byte then high byte
pub const CRC_LEN: usize = 2;

/// Maximum number of data bytes in a single frame
pub const MAX_DATA_LEN: usize = 11;

/// Shortest legal frame: header + CRC with no data (5 bytes)
pub const MIN_FRAME_LEN: usize = HEADER_LEN + CRC_LEN;

/// Longest legal frame: header + 11 data bytes + CRC (16 bytes)
pub const MAX_FRAME_LEN: usize = HEADER_LEN + MAX_DATA_LEN + CRC_LEN;

// ============================================================================
// Ack Byte
// ============================================================================

/// Ack byte carried by every command from the bus master
pub const COMMAND_ACK: u8 = 0x20;

/// Ack byte carried by a successful reply from the motor
pub const REPLY_ACK: u8 = 0x10;

/// MSB of the function byte, set by the motor on a message error reply
pub const ERROR_REPLY_FLAG: u8 = 0x80;

/// Mask extracting the operative function code
pub const FUNCTION_MASK: u8 = 0x7F;

// ============================================================================
// Addressing
// ============================================================================

/// Broadcast address; motors answer with their actual address
pub const BROADCAST_ADDRESS: u8 = 0x00;

/// Factory default address of the EPC ECM
pub const DEFAULT_ADDRESS: u8 = 0x15;

/// Lowest unicast address
pub const MIN_UNICAST_ADDRESS: u8 = 0x15;

/// Highest unicast address
pub const MAX_UNICAST_ADDRESS: u8 = 0xF7;

/// First address of the range reserved for MODBUS compatibility (0xF8..=0xFF)
pub const RESERVED_ADDRESS_START: u8 = 0xF8;

// ============================================================================
// Function Codes
// ============================================================================

/// Go
pub const FC_GO: u8 = 0x41;

/// Stop
pub const FC_STOP: u8 = 0x42;

/// Status
pub const FC_STATUS: u8 = 0x43;

/// Set Demand
pub const FC_SET_DEMAND: u8 = 0x44;

/// Read Sensor
pub const FC_READ_SENSOR: u8 = 0x45;

/// Read Identification (variable length)
pub const FC_READ_IDENTIFICATION: u8 = 0x46;

/// Configuration Read/Write (variable length)
pub const FC_CONFIGURATION: u8 = 0x64;

/// Store Configuration
pub const FC_STORE_CONFIGURATION: u8 = 0x65;

// ============================================================================
// Idle Timing
// ============================================================================

/// Bits per character on the wire: start + 8 data + parity/stop + stop
pub const BITS_PER_CHAR: u64 = 11;

/// Minimum bus idle between frames, in tenths of a character time (3.5 chars)
pub const INTER_FRAME_IDLE_TENTHS: u64 = 35;

/// Baud rate the motor ships with
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Minimum delay before the motor replies to a command (at 9600 baud)
pub const MIN_REPLY_DELAY_MS: u64 = 4;

/// Maximum delay before an ordinary reply arrives
pub const MAX_REPLY_DELAY_MS: u64 = 10;

/// Maximum delay before the reply to Store Configuration arrives
pub const STORE_CONFIGURATION_REPLY_DELAY_MS: u64 = 1000;
