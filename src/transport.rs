//! Serial transport layer
//!
//! The codec is pure; moving bytes is the transport's job. A transport writes
//! one complete frame, then hands back the next frame it hears, using bus
//! silence to find the end of the frame. It does not interpret the bytes.
//!
//! [`RtuTransport`] drives a real serial port (requires the `rtu` feature).
//! Tests and simulators implement [`VgreenTransport`] directly.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::VgreenResult;

#[cfg(feature = "rtu")]
pub use rtu::RtuTransport;

/// Byte transport for one half-duplex bus.
///
/// # Implemented By
///
/// - [`RtuTransport`] - tokio-serial port (requires `rtu` feature)
pub trait VgreenTransport: Send {
    /// Write one complete frame, honouring the inter-frame idle time.
    fn write_frame(&mut self, frame: &[u8]) -> impl Future<Output = VgreenResult<()>> + Send;

    /// Read the next frame.
    ///
    /// Waits up to `timeout` for the first byte, then collects bytes until the
    /// bus goes idle. Fails with `VgreenError::Timeout` if nothing arrives.
    fn read_frame(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = VgreenResult<Vec<u8>>> + Send;

    /// Whether the underlying port is open.
    fn is_connected(&self) -> bool;

    /// Close the underlying port.
    fn close(&mut self) -> impl Future<Output = VgreenResult<()>> + Send;

    /// Traffic counters.
    fn get_stats(&self) -> TransportStats;
}

/// Traffic counters kept by a transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Frames written to the bus
    pub frames_sent: u64,
    /// Frames read from the bus
    pub frames_received: u64,
    /// Bytes written, CRC included
    pub bytes_sent: u64,
    /// Bytes read, CRC included
    pub bytes_received: u64,
    /// Failed reads and writes, timeouts included
    pub errors: u64,
    /// Reads that saw no reply in time
    pub timeouts: u64,
    /// Time of the last frame sent or received
    pub last_activity: Option<DateTime<Utc>>,
}

impl TransportStats {
    /// Count a frame written to the bus
    pub fn record_sent(&mut self, len: usize) {
        self.frames_sent += 1;
        self.bytes_sent += len as u64;
        self.last_activity = Some(Utc::now());
    }

    /// Count a frame read from the bus
    pub fn record_received(&mut self, len: usize) {
        self.frames_received += 1;
        self.bytes_received += len as u64;
        self.last_activity = Some(Utc::now());
    }

    /// Count an I/O failure
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Count a read or write that ran out of time
    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
        self.errors += 1;
    }
}

/// Hex dump used for packet logging, e.g. `15 41 20 51 8C`
pub fn format_hex_frame(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(feature = "rtu")]
mod rtu {
    use std::time::Duration;

    use bytes::BytesMut;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::time::{sleep, timeout};
    use tokio_serial::{DataBits, Parity, SerialStream, StopBits};
    use tracing::{debug, info};

    use super::{format_hex_frame, TransportStats, VgreenTransport};
    use crate::bus_config::frame_gap;
    use crate::constants::MAX_FRAME_LEN;
    use crate::error::{VgreenError, VgreenResult};

    /// Serial port transport.
    ///
    /// The motor talks 8 data bits, no parity, 1 stop bit.
    pub struct RtuTransport {
        port: Option<SerialStream>,
        port_name: String,
        baud_rate: u32,
        data_bits: DataBits,
        stop_bits: StopBits,
        parity: Parity,
        frame_gap: Duration,
        stats: TransportStats,
        packet_logging: bool,
    }

    impl RtuTransport {
        /// Open `port` at `baud_rate`, 8N1.
        pub fn new(port: &str, baud_rate: u32) -> VgreenResult<Self> {
            Self::with_config(port, baud_rate, DataBits::Eight, StopBits::One, Parity::None)
        }

        /// Open `port` with explicit line settings.
        pub fn with_config(
            port: &str,
            baud_rate: u32,
            data_bits: DataBits,
            stop_bits: StopBits,
            parity: Parity,
        ) -> VgreenResult<Self> {
            let mut transport = Self {
                port: None,
                port_name: port.to_string(),
                baud_rate,
                data_bits,
                stop_bits,
                parity,
                frame_gap: frame_gap(baud_rate),
                stats: TransportStats::default(),
                packet_logging: false,
            };
            transport.connect()?;
            Ok(transport)
        }

        /// Enable or disable hex dumps of every frame at `info` level
        pub fn set_packet_logging(&mut self, enabled: bool) {
            self.packet_logging = enabled;
        }

        /// Serial device path
        pub fn port_name(&self) -> &str {
            &self.port_name
        }

        fn connect(&mut self) -> VgreenResult<()> {
            let builder = tokio_serial::new(&self.port_name, self.baud_rate)
                .data_bits(self.data_bits)
                .stop_bits(self.stop_bits)
                .parity(self.parity);

            let port = SerialStream::open(&builder).map_err(|e| {
                VgreenError::connection(format!(
                    "Failed to open serial port {}: {}",
                    self.port_name, e
                ))
            })?;
            debug!("Opened {} at {} baud", self.port_name, self.baud_rate);

            self.port = Some(port);
            Ok(())
        }
    }

    impl VgreenTransport for RtuTransport {
        async fn write_frame(&mut self, frame: &[u8]) -> VgreenResult<()> {
            if self.port.is_none() {
                self.connect()?;
            }

            // Bus must be idle for 3.5 characters before a new frame
            sleep(self.frame_gap).await;

            if self.packet_logging {
                info!("[VGREEN-RTU] send {}", format_hex_frame(frame));
            }

            let port = self
                .port
                .as_mut()
                .ok_or_else(|| VgreenError::connection("Serial port not connected"))?;
            if let Err(e) = port.write_all(frame).await {
                self.stats.record_error();
                return Err(VgreenError::io(format!("Failed to send frame: {}", e)));
            }
            if let Err(e) = port.flush().await {
                self.stats.record_error();
                return Err(VgreenError::io(format!("Failed to flush frame: {}", e)));
            }

            self.stats.record_sent(frame.len());
            Ok(())
        }

        async fn read_frame(&mut self, reply_timeout: Duration) -> VgreenResult<Vec<u8>> {
            let gap = self.frame_gap;
            let port = self
                .port
                .as_mut()
                .ok_or_else(|| VgreenError::connection("Serial port not connected"))?;

            let mut buffer = BytesMut::with_capacity(MAX_FRAME_LEN + 1);
            let mut chunk = [0u8; MAX_FRAME_LEN + 1];

            match timeout(reply_timeout, port.read(&mut chunk)).await {
                Ok(Ok(0)) => {
                    self.stats.record_error();
                    return Err(VgreenError::connection("Serial port closed"));
                }
                Ok(Ok(n)) => buffer.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => {
                    self.stats.record_error();
                    return Err(VgreenError::io(format!("Serial read error: {}", e)));
                }
                Err(_) => {
                    self.stats.record_timeout();
                    return Err(VgreenError::timeout(
                        "read reply",
                        reply_timeout.as_millis() as u64,
                    ));
                }
            }

            // One byte past the maximum is enough for decode to reject it
            while buffer.len() <= MAX_FRAME_LEN {
                match timeout(gap, port.read(&mut chunk)).await {
                    Ok(Ok(0)) => break,
                    Ok(Ok(n)) => buffer.extend_from_slice(&chunk[..n]),
                    Ok(Err(e)) => {
                        self.stats.record_error();
                        return Err(VgreenError::io(format!("Serial read error: {}", e)));
                    }
                    // Idle gap: end of frame
                    Err(_) => break,
                }
            }

            if self.packet_logging {
                info!("[VGREEN-RTU] receive {}", format_hex_frame(&buffer));
            }
            self.stats.record_received(buffer.len());
            Ok(buffer.to_vec())
        }

        fn is_connected(&self) -> bool {
            self.port.is_some()
        }

        async fn close(&mut self) -> VgreenResult<()> {
            // Dropping the stream releases the port
            self.port.take();
            Ok(())
        }

        fn get_stats(&self) -> TransportStats {
            self.stats.clone()
        }
    }
}
