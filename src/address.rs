//! Bus address validation
//!
//! 0x00 is broadcast. Unicast addresses are odd and lie in 0x15..=0xF7;
//! 0xF8..=0xFF are reserved for MODBUS compatibility.

use crate::constants::{BROADCAST_ADDRESS, MAX_UNICAST_ADDRESS, MIN_UNICAST_ADDRESS};
use crate::error::{VgreenError, VgreenResult};

/// Whether `address` is usable on the bus
#[inline]
pub fn is_valid(address: u8) -> bool {
    address == BROADCAST_ADDRESS
        || (address % 2 == 1 && (MIN_UNICAST_ADDRESS..=MAX_UNICAST_ADDRESS).contains(&address))
}

/// Validate a bus address
pub fn validate(address: u8) -> VgreenResult<()> {
    if is_valid(address) {
        Ok(())
    } else {
        Err(VgreenError::InvalidAddress { address })
    }
}

/// Check the address of a reply against the address the command went to.
///
/// A motor answers a broadcast with its own address, so a broadcast command
/// accepts any valid unicast reply address.
pub fn check_reply(expected: u8, received: u8) -> VgreenResult<()> {
    if received == expected {
        return Ok(());
    }
    if expected == BROADCAST_ADDRESS && received != BROADCAST_ADDRESS && is_valid(received) {
        return Ok(());
    }
    Err(VgreenError::AddressMismatch { expected, received })
}
