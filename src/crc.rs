//! Modbus CRC-16
//!
//! Polynomial 0xA001 (reflected 0x8005), initial value 0xFFFF, no final XOR.
//! The checksum travels low byte first.

use crc::{Crc, CRC_16_MODBUS};

use crate::constants::CRC_LEN;

const CRC_MODBUS: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Compute the CRC-16 of `data`.
///
/// Any input is valid, including an empty slice (which yields 0xFFFF).
#[inline]
pub fn compute(data: &[u8]) -> u16 {
    CRC_MODBUS.checksum(data)
}

/// Compute the CRC-16 of `data` as `[lo, hi]`, the order it is sent in.
#[inline]
pub fn compute_bytes(data: &[u8]) -> [u8; 2] {
    compute(data).to_le_bytes()
}

/// Check a frame whose last two bytes are its CRC.
///
/// Frames shorter than the CRC itself never verify.
pub fn verify(frame: &[u8]) -> bool {
    if frame.len() < CRC_LEN {
        return false;
    }
    let split = frame.len() - CRC_LEN;
    let received = u16::from_le_bytes([frame[split], frame[split + 1]]);
    compute(&frame[..split]) == received
}
