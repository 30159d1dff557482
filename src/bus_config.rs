//! # Bus Configuration
//!
//! Timing and retry settings for one serial bus.
//!
//! ## Protocol Timing
//!
//! - **Inter-frame idle**: at least 3.5 character times before and after a frame
//! - **Reply window**: the motor replies 4ms to 10ms after a command (9600 baud)
//! - **Store Configuration**: the reply may take up to 1 second

use std::time::Duration;

use crate::constants::{
    BITS_PER_CHAR, DEFAULT_BAUD_RATE, FC_STORE_CONFIGURATION, FUNCTION_MASK,
    INTER_FRAME_IDLE_TENTHS, MAX_REPLY_DELAY_MS, STORE_CONFIGURATION_REPLY_DELAY_MS,
};

/// Default number of resends after a retryable failure.
pub const DEFAULT_MAX_RETRIES: u8 = 2;

/// Default pause before a resend, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 20;

/// Minimum bus idle between frames at `baud_rate` (3.5 character times).
///
/// A zero baud rate is treated as the default 9600.
pub fn frame_gap(baud_rate: u32) -> Duration {
    let baud = if baud_rate == 0 {
        u64::from(DEFAULT_BAUD_RATE)
    } else {
        u64::from(baud_rate)
    };
    let char_time_us = BITS_PER_CHAR * 1_000_000 / baud;
    Duration::from_micros(char_time_us * INTER_FRAME_IDLE_TENTHS / 10)
}

/// Timing and retry settings for a bus.
///
/// # Example
///
/// ```rust
/// use vgreen_modbus::BusConfig;
///
/// let config = BusConfig::new()
///     .with_baud_rate(19200)
///     .with_max_retries(5);
///
/// assert_eq!(config.max_retries, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Line speed, used to derive the inter-frame gap.
    pub baud_rate: u32,
    /// Time allowed for an ordinary reply to arrive (milliseconds).
    pub reply_timeout_ms: u64,
    /// Time allowed for the Store Configuration reply (milliseconds).
    pub store_timeout_ms: u64,
    /// Resends after a retryable failure.
    pub max_retries: u8,
    /// Pause before each resend (milliseconds).
    pub retry_delay_ms: u64,
}

impl BusConfig {
    /// Create a configuration with the protocol's nominal timing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generous timing for long cables, adapters with buffering, or a busy
    /// host:
    /// - 50ms reply window
    /// - 2s Store Configuration window
    /// - 3 retries, 100ms apart
    pub fn conservative() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            reply_timeout_ms: 50,
            store_timeout_ms: 2 * STORE_CONFIGURATION_REPLY_DELAY_MS,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the ordinary reply timeout.
    pub fn with_reply_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.reply_timeout_ms = timeout_ms;
        self
    }

    /// Set the Store Configuration reply timeout.
    pub fn with_store_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.store_timeout_ms = timeout_ms;
        self
    }

    /// Set the number of resends.
    pub fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the pause before each resend.
    pub fn with_retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_delay_ms = delay_ms;
        self
    }

    /// Inter-frame gap at the configured baud rate.
    pub fn frame_gap(&self) -> Duration {
        frame_gap(self.baud_rate)
    }

    /// Reply timeout for a command with function code `function`.
    pub fn reply_timeout_for(&self, function: u8) -> Duration {
        if function & FUNCTION_MASK == FC_STORE_CONFIGURATION {
            Duration::from_millis(self.store_timeout_ms)
        } else {
            Duration::from_millis(self.reply_timeout_ms)
        }
    }

    /// Pause before a resend.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Total attempts per transaction, first send included.
    pub fn attempts(&self) -> u32 {
        u32::from(self.max_retries) + 1
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            reply_timeout_ms: MAX_REPLY_DELAY_MS,
            store_timeout_ms: STORE_CONFIGURATION_REPLY_DELAY_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
