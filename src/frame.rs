//! Stack-allocated frame buffer
//!
//! A frame never exceeds 16 bytes, so it lives in a fixed array rather than on
//! the heap.

use tracing::debug;

use crate::constants::{CRC_LEN, HEADER_LEN, MAX_FRAME_LEN};
use crate::crc;
use crate::error::{VgreenError, VgreenResult};

/// Fixed-capacity wire frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    data: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl Frame {
    /// Create an empty frame
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0; MAX_FRAME_LEN],
            len: 0,
        }
    }

    /// Copy a received byte sequence into a frame
    pub fn from_slice(bytes: &[u8]) -> VgreenResult<Self> {
        if bytes.len() > MAX_FRAME_LEN {
            return Err(VgreenError::malformed(
                bytes,
                format!("frame exceeds {} bytes", MAX_FRAME_LEN),
            ));
        }
        let mut frame = Self::new();
        frame.data[..bytes.len()].copy_from_slice(bytes);
        frame.len = bytes.len();
        Ok(frame)
    }

    /// Push a single byte
    #[inline]
    pub fn push(&mut self, byte: u8) -> VgreenResult<()> {
        if self.len >= MAX_FRAME_LEN {
            return Err(VgreenError::malformed(self.as_slice(), "frame buffer full"));
        }
        self.data[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    /// Extend with a byte slice
    #[inline]
    pub fn extend(&mut self, bytes: &[u8]) -> VgreenResult<()> {
        if self.len + bytes.len() > MAX_FRAME_LEN {
            return Err(VgreenError::malformed(
                self.as_slice(),
                format!(
                    "frame would exceed max size: {} + {} > {}",
                    self.len,
                    bytes.len(),
                    MAX_FRAME_LEN
                ),
            ));
        }
        self.data[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    /// Append the CRC of everything pushed so far, low byte first
    #[inline]
    pub fn push_crc(&mut self) -> VgreenResult<()> {
        let crc = crc::compute_bytes(self.as_slice());
        self.extend(&crc)
    }

    /// Frame bytes
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Current length
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy into an owned vector
    #[inline]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Address byte
    #[inline]
    pub fn address(&self) -> Option<u8> {
        self.as_slice().first().copied()
    }

    /// Function byte, error bit included
    #[inline]
    pub fn function_code(&self) -> Option<u8> {
        self.as_slice().get(1).copied()
    }

    /// Ack byte
    #[inline]
    pub fn ack(&self) -> Option<u8> {
        self.as_slice().get(2).copied()
    }

    /// Bytes between the header and the CRC, empty when the frame is too short
    pub fn payload(&self) -> &[u8] {
        if self.len < HEADER_LEN + CRC_LEN {
            return &[];
        }
        &self.data[HEADER_LEN..self.len - CRC_LEN]
    }

    /// CRC as carried by the frame, `[lo, hi]`
    pub fn crc_bytes(&self) -> Option<[u8; 2]> {
        if self.len < CRC_LEN {
            return None;
        }
        Some([self.data[self.len - 2], self.data[self.len - 1]])
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Frame builder - fluent API
pub struct FrameBuilder {
    frame: Frame,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuilder {
    /// Create a new builder
    #[inline]
    pub fn new() -> Self {
        Self {
            frame: Frame::new(),
        }
    }

    /// Add the address byte
    #[inline]
    pub fn address(mut self, address: u8) -> VgreenResult<Self> {
        self.frame.push(address)?;
        Ok(self)
    }

    /// Add the function byte
    #[inline]
    pub fn function_code(mut self, fc: u8) -> VgreenResult<Self> {
        self.frame.push(fc)?;
        Ok(self)
    }

    /// Add the ack byte
    #[inline]
    pub fn ack(mut self, ack: u8) -> VgreenResult<Self> {
        self.frame.push(ack)?;
        Ok(self)
    }

    /// Add payload bytes
    #[inline]
    pub fn data(mut self, data: &[u8]) -> VgreenResult<Self> {
        self.frame.extend(data)?;
        Ok(self)
    }

    /// Append the CRC and finish the frame
    pub fn build(mut self) -> VgreenResult<Frame> {
        self.frame.push_crc()?;
        debug!(
            "Frame built: addr={:02X?} fc={:02X?} total_len={}",
            self.frame.address(),
            self.frame.function_code(),
            self.frame.len()
        );
        Ok(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_basic_operations() {
        let mut frame = Frame::new();
        assert!(frame.is_empty());

        frame.push(0x15).unwrap();
        frame.push(0x43).unwrap();
        frame.push(0x10).unwrap();
        frame.extend(&[0x00]).unwrap();
        frame.push_crc().unwrap();

        assert_eq!(frame.len(), 6);
        assert_eq!(frame.as_slice(), &[0x15, 0x43, 0x10, 0x00, 0xF8, 0x3C]);
        assert_eq!(frame.payload(), &[0x00]);
        assert_eq!(frame.crc_bytes(), Some([0xF8, 0x3C]));
    }

    #[test]
    fn test_frame_builder() {
        let frame = FrameBuilder::new()
            .address(0x15)
            .unwrap()
            .function_code(0x41)
            .unwrap()
            .ack(0x20)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(frame.as_slice(), &[0x15, 0x41, 0x20, 0x51, 0x8C]);
        assert_eq!(frame.address(), Some(0x15));
        assert_eq!(frame.function_code(), Some(0x41));
        assert_eq!(frame.ack(), Some(0x20));
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn test_capacity_enforced() {
        let mut frame = Frame::from_slice(&[0u8; MAX_FRAME_LEN]).unwrap();
        assert!(matches!(
            frame.push(0x00),
            Err(VgreenError::MalformedFrame { .. })
        ));
        assert!(Frame::from_slice(&[0u8; MAX_FRAME_LEN + 1]).is_err());

        let overflow = FrameBuilder::new()
            .address(0x15)
            .and_then(|b| b.function_code(0x64))
            .and_then(|b| b.ack(0x20))
            .and_then(|b| b.data(&[0u8; 14]));
        assert!(overflow.is_err());
    }

    #[test]
    fn test_short_frame_accessors() {
        let frame = Frame::from_slice(&[0x15]).unwrap();
        assert_eq!(frame.function_code(), None);
        assert_eq!(frame.crc_bytes(), None);
        assert!(frame.payload().is_empty());
    }
}
