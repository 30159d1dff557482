//! # VGreen Modbus - Serial Framing for VGreen Motors
//!
//! Frame codec and bus client for the Modbus-style serial protocol spoken by
//! VGreen variable-speed pump motors.
//!
//! ## Frame Layout
//!
//! ```text
//! [address][function][ack][data 0..=11][crc lo][crc hi]
//! ```
//!
//! - **Address**: 0 (broadcast) or an odd value in 0x15..=0xF7
//! - **Ack**: 0x20 on commands, 0x10 on accepted replies, otherwise a NACK code
//! - **CRC**: CRC-16/MODBUS over everything before it, low byte first
//! - **Error replies**: the motor sets bit 7 of the function byte
//!
//! ## Supported Function Codes
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
//!
//! ## Quick Start
//!
//! ```rust
//! use vgreen_modbus::{decode, encode, VgreenResult};
//!
//! fn main() -> VgreenResult<()> {
//!     let command = encode(0x15, 0x41, &[])?;
//!     assert_eq!(command, vec![0x15, 0x41, 0x20, 0x51, 0x8C]);
//!
//!     let reply = decode(&[0x15, 0x43, 0x10, 0x00, 0xF8, 0x3C], 0x15, 0x43)?;
//!     assert!(reply.check_ack().is_ok());
//!     Ok(())
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// Protocol constants
pub mod constants;

/// CRC-16/MODBUS engine
pub mod crc;

/// Function catalog
pub mod catalog;

/// Ack byte and NACK catalog
pub mod ack;

/// Sensor fault catalog and readings
pub mod sensor;

/// Bus address rules
pub mod address;

/// Stack-allocated frame buffer
pub mod frame;

/// Decoded and encoded messages
pub mod message;

/// Frame encoding and decoding
pub mod codec;

/// Bus timing and retry settings
pub mod bus_config;

/// Serial transport layer
#[cfg(feature = "std")]
pub mod transport;

/// Bus master client
#[cfg(feature = "std")]
pub mod client;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Async runtime (users can use vgreen_modbus::tokio) ===
#[cfg(feature = "std")]
pub use tokio;

// === Codec ===
pub use codec::{
    decode, encode, parse_demand_reply, parse_sensor_reply, parse_status_reply, VgreenCodec,
};
pub use message::{Direction, Message};

// === Error handling ===
pub use error::{VgreenError, VgreenResult};

// === Catalogs ===
pub use ack::{classify, AckStatus, NackCode};
pub use catalog::{FrameLength, FunctionDescriptor, VgreenFunction};
pub use sensor::{SensorFaultCode, SensorReading};

// === Configuration ===
pub use bus_config::{frame_gap, BusConfig};

// === Frame (advanced usage) ===
pub use frame::{Frame, FrameBuilder};

// === Client and transport ===
#[cfg(feature = "std")]
pub use client::VgreenClient;
#[cfg(feature = "std")]
pub use transport::{TransportStats, VgreenTransport};

#[cfg(feature = "rtu")]
pub use transport::RtuTransport;

// === Protocol limits (commonly needed constants) ===
pub use constants::{
    BROADCAST_ADDRESS, DEFAULT_ADDRESS, MAX_DATA_LEN, MAX_FRAME_LEN, MIN_FRAME_LEN,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!("VGreen Modbus v{} - VGreen motor serial protocol", VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info() {
        assert!(info().contains(VERSION));
    }
}
