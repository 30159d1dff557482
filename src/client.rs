//! Bus master client
//!
//! [`VgreenClient`] runs one command/reply transaction at a time over any
//! [`VgreenTransport`]: encode, send, wait for the reply, decode, check the
//! ack. Retryable failures (CRC errors, malformed replies, timeouts and the
//! "cannot execute now" NACK) are resent up to [`BusConfig::max_retries`]
//! times.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "rtu")]
//! # async fn run() -> vgreen_modbus::VgreenResult<()> {
//! use vgreen_modbus::{RtuTransport, VgreenClient};
//!
//! let transport = RtuTransport::new("/dev/ttyUSB0", 9600)?;
//! let mut client = VgreenClient::new(transport);
//!
//! client.set_demand(0x15, 0x00, 1000).await?;
//! client.go(0x15).await?;
//! let status = client.status(0x15).await?;
//! println!("status: 0x{:02X}", status);
//! # Ok(())
//! # }
//! ```

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::bus_config::BusConfig;
use crate::codec::{self, parse_demand_reply, parse_sensor_reply, parse_status_reply, VgreenCodec};
use crate::error::VgreenResult;
use crate::message::Message;
use crate::sensor::SensorReading;
use crate::transport::{TransportStats, VgreenTransport};

/// Client driving one bus through a transport.
///
/// Transactions take `&mut self`, so a second command cannot go out before the
/// previous reply has been decoded or has timed out.
pub struct VgreenClient<T: VgreenTransport> {
    transport: T,
    config: BusConfig,
    retries: u64,
}

impl<T: VgreenTransport> VgreenClient<T> {
    /// Create a client with the default bus timing.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, BusConfig::default())
    }

    /// Create a client with explicit bus timing.
    pub fn with_config(transport: T, config: BusConfig) -> Self {
        Self {
            transport,
            config,
            retries: 0,
        }
    }

    /// Get a reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Bus timing in use.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Resends performed since the client was created.
    pub fn retry_count(&self) -> u64 {
        self.retries
    }

    /// Send an already built command and return the accepted reply.
    pub async fn transact(&mut self, command: &Message) -> VgreenResult<Message> {
        let attempts = self.config.attempts();
        let mut attempt = 1;

        loop {
            match self.transact_once(command).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        "fn=0x{:02X} addr=0x{:02X} attempt {}/{} failed: {}",
                        command.function(),
                        command.address(),
                        attempt,
                        attempts,
                        e
                    );
                    self.retries += 1;
                    attempt += 1;
                    sleep(self.config.retry_delay()).await;
                }
                Err(e) => {
                    debug!("Transaction failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    async fn transact_once(&mut self, command: &Message) -> VgreenResult<Message> {
        let frame = command.to_bytes();
        self.transport.write_frame(&frame).await?;

        let reply_timeout = self.config.reply_timeout_for(command.function());
        let raw = self.transport.read_frame(reply_timeout).await?;

        let reply = codec::decode(&raw, command.address(), command.function())?;
        reply.check_ack()?;
        debug!("Reply accepted: {}", reply);
        Ok(reply)
    }

    /// Build, send and check an arbitrary command.
    pub async fn execute(&mut self, address: u8, function: u8, data: &[u8]) -> VgreenResult<Message> {
        let command = VgreenCodec::build_command(address, function, data)?;
        self.transact(&command).await
    }

    /// Go (0x41): start the motor.
    pub async fn go(&mut self, address: u8) -> VgreenResult<()> {
        let command = VgreenCodec::build_go(address)?;
        self.transact(&command).await.map(|_| ())
    }

    /// Stop (0x42): stop the motor.
    pub async fn stop(&mut self, address: u8) -> VgreenResult<()> {
        let command = VgreenCodec::build_stop(address)?;
        self.transact(&command).await.map(|_| ())
    }

    /// Status (0x43): read the status byte.
    pub async fn status(&mut self, address: u8) -> VgreenResult<u8> {
        let command = VgreenCodec::build_status(address)?;
        let reply = self.transact(&command).await?;
        parse_status_reply(&reply)
    }

    /// Set Demand (0x44): returns the mode and demand echoed by the motor.
    pub async fn set_demand(&mut self, address: u8, mode: u8, demand: u16) -> VgreenResult<(u8, u16)> {
        let command = VgreenCodec::build_set_demand(address, mode, demand)?;
        let reply = self.transact(&command).await?;
        parse_demand_reply(&reply)
    }

    /// Read Sensor (0x45).
    ///
    /// A sensor fault is not an error here; check [`SensorReading::fault`].
    pub async fn read_sensor(&mut self, address: u8, page: u8, sensor: u8) -> VgreenResult<SensorReading> {
        let command = VgreenCodec::build_read_sensor(address, page, sensor)?;
        let reply = self.transact(&command).await?;
        parse_sensor_reply(&reply)
    }

    /// Read Identification (0x46): returns the reply payload.
    pub async fn read_identification(&mut self, address: u8, data: &[u8]) -> VgreenResult<Vec<u8>> {
        let command = VgreenCodec::build_read_identification(address, data)?;
        let reply = self.transact(&command).await?;
        Ok(reply.data().to_vec())
    }

    /// Configuration (0x64): returns the reply payload.
    pub async fn configuration(&mut self, address: u8, data: &[u8]) -> VgreenResult<Vec<u8>> {
        let command = VgreenCodec::build_configuration(address, data)?;
        let reply = self.transact(&command).await?;
        Ok(reply.data().to_vec())
    }

    /// Store Configuration (0x65): persist the configuration.
    ///
    /// Uses the long Store Configuration reply timeout.
    pub async fn store_configuration(&mut self, address: u8) -> VgreenResult<()> {
        let command = VgreenCodec::build_store_configuration(address)?;
        self.transact(&command).await.map(|_| ())
    }

    /// Whether the transport is open.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Close the transport.
    pub async fn close(&mut self) -> VgreenResult<()> {
        self.transport.close().await
    }

    /// Transport traffic counters.
    pub fn get_stats(&self) -> TransportStats {
        self.transport.get_stats()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::time::Duration;

    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::ack::NackCode;
    use crate::crc;
    use crate::error::VgreenError;
    use crate::sensor::SensorFaultCode;

    /// Mock transport replaying canned reply frames
    struct MockTransport {
        /// Frames written by the client
        written: Vec<Vec<u8>>,
        /// Timeouts passed to each read
        read_timeouts: Vec<Duration>,
        /// Pre-configured replies (FIFO queue)
        replies: VecDeque<VgreenResult<Vec<u8>>>,
        connected: bool,
        stats: TransportStats,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                written: Vec::new(),
                read_timeouts: Vec::new(),
                replies: VecDeque::new(),
                connected: true,
                stats: TransportStats::default(),
            }
        }

        fn add_reply(&mut self, reply: VgreenResult<Vec<u8>>) {
            self.replies.push_back(reply);
        }
    }

    impl VgreenTransport for MockTransport {
        fn write_frame(&mut self, frame: &[u8]) -> impl Future<Output = VgreenResult<()>> + Send {
            self.written.push(frame.to_vec());
            self.stats.record_sent(frame.len());
            async { Ok(()) }
        }

        fn read_frame(
            &mut self,
            timeout: Duration,
        ) -> impl Future<Output = VgreenResult<Vec<u8>>> + Send {
            self.read_timeouts.push(timeout);
            let reply = self
                .replies
                .pop_front()
                .unwrap_or_else(|| Err(VgreenError::timeout("read reply", 10)));
            if let Ok(bytes) = &reply {
                self.stats.record_received(bytes.len());
            }
            async move { reply }
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn close(&mut self) -> impl Future<Output = VgreenResult<()>> + Send {
            self.connected = false;
            async { Ok(()) }
        }

        fn get_stats(&self) -> TransportStats {
            self.stats.clone()
        }
    }

    fn reply_frame(address: u8, function: u8, ack: u8, data: &[u8]) -> Vec<u8> {
        let mut frame = vec![address, function, ack];
        frame.extend_from_slice(data);
        let crc = crc::compute_bytes(&frame);
        frame.extend_from_slice(&crc);
        frame
    }

    fn client_with(replies: Vec<VgreenResult<Vec<u8>>>) -> VgreenClient<MockTransport> {
        let mut mock = MockTransport::new();
        for reply in replies {
            mock.add_reply(reply);
        }
        VgreenClient::with_config(mock, BusConfig::new().with_retry_delay_ms(0))
    }

    #[tokio::test]
    async fn test_go_sends_expected_frame() {
        let mut client = client_with(vec![Ok(reply_frame(0x15, 0x41, 0x10, &[]))]);

        assert_ok!(client.go(0x15).await);

        assert_eq!(client.transport().written, vec![vec![0x15, 0x41, 0x20, 0x51, 0x8C]]);
        assert_eq!(client.retry_count(), 0);
    }

    #[tokio::test]
    async fn test_status_returns_byte() {
        let mut client = client_with(vec![Ok(reply_frame(0x15, 0x43, 0x10, &[0x0B]))]);
        assert_eq!(client.status(0x15).await.unwrap(), 0x0B);
        assert_eq!(client.get_stats().frames_received, 1);
    }

    #[tokio::test]
    async fn test_set_demand_echo() {
        let mut client = client_with(vec![Ok(reply_frame(0x15, 0x44, 0x10, &[0x00, 0xE8, 0x03]))]);

        let (mode, demand) = client.set_demand(0x15, 0x00, 1000).await.unwrap();

        assert_eq!((mode, demand), (0x00, 1000));
        assert_eq!(
            client.transport().written[0],
            vec![0x15, 0x44, 0x20, 0x00, 0xE8, 0x03, 0xF7, 0x10]
        );
    }

    #[tokio::test]
    async fn test_read_sensor_with_fault() {
        let mut client = client_with(vec![Ok(reply_frame(0x15, 0x45, 0x10, &[0x00, 0x01, 0x21, 0x00]))]);

        let reading = client.read_sensor(0x15, 0x00, 0x01).await.unwrap();

        assert_eq!(reading.page, 0x00);
        assert_eq!(reading.sensor, 0x01);
        assert_eq!(reading.fault(), Ok(Some(SensorFaultCode::from_u8(0x21).unwrap())));
    }

    #[tokio::test]
    async fn test_nack_is_not_retried() {
        let mut client = client_with(vec![Ok(reply_frame(0x15, 0x41, 0x04, &[]))]);

        let err = client.go(0x15).await.unwrap_err();

        assert_eq!(
            err,
            VgreenError::Nack {
                function: 0x41,
                code: NackCode::FaultMode
            }
        );
        assert_eq!(client.transport().written.len(), 1);
    }

    #[tokio::test]
    async fn test_cannot_execute_now_is_retried() {
        let mut client = client_with(vec![
            Ok(reply_frame(0x15, 0x41, 0x06, &[])),
            Ok(reply_frame(0x15, 0x41, 0x10, &[])),
        ]);

        client.go(0x15).await.unwrap();

        assert_eq!(client.transport().written.len(), 2);
        assert_eq!(client.retry_count(), 1);
    }

    #[tokio::test]
    async fn test_crc_errors_exhaust_retries() {
        let mut bad = reply_frame(0x15, 0x42, 0x10, &[]);
        bad[4] ^= 0xFF;
        let mut client = client_with(vec![Ok(bad.clone()), Ok(bad.clone()), Ok(bad)]);

        let err = assert_err!(client.stop(0x15).await);

        assert!(matches!(err, VgreenError::CrcMismatch { .. }));
        assert_eq!(client.transport().written.len(), 3);
        assert_eq!(client.retry_count(), 2);
    }

    #[tokio::test]
    async fn test_timeout_then_success() {
        let mut client = client_with(vec![
            Err(VgreenError::timeout("read reply", 10)),
            Ok(reply_frame(0x15, 0x43, 0x10, &[0x01])),
        ]);

        assert_eq!(client.status(0x15).await.unwrap(), 0x01);
        assert_eq!(client.transport().written.len(), 2);
    }

    #[tokio::test]
    async fn test_address_mismatch_is_not_retried() {
        let mut client = client_with(vec![Ok(reply_frame(0x17, 0x41, 0x10, &[]))]);

        let err = client.go(0x15).await.unwrap_err();

        assert_eq!(
            err,
            VgreenError::AddressMismatch {
                expected: 0x15,
                received: 0x17
            }
        );
        assert_eq!(client.transport().written.len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_accepts_any_unicast_reply() {
        let mut client = client_with(vec![Ok(reply_frame(0x15, 0x42, 0x10, &[]))]);
        client.stop(0x00).await.unwrap();
        assert_eq!(client.transport().written[0][0], 0x00);
    }

    #[tokio::test]
    async fn test_invalid_address_sends_nothing() {
        let mut client = client_with(vec![]);

        let err = client.go(0x16).await.unwrap_err();

        assert_eq!(err, VgreenError::InvalidAddress { address: 0x16 });
        assert!(client.transport().written.is_empty());
    }

    #[tokio::test]
    async fn test_store_configuration_uses_long_timeout() {
        let mut client = client_with(vec![
            Ok(reply_frame(0x15, 0x43, 0x10, &[0x00])),
            Ok(reply_frame(0x15, 0x65, 0x10, &[])),
        ]);

        assert_ok!(client.status(0x15).await);
        assert_ok!(client.store_configuration(0x15).await);

        assert_eq!(
            client.transport().read_timeouts,
            vec![Duration::from_millis(10), Duration::from_secs(1)]
        );
    }

    #[tokio::test]
    async fn test_configuration_returns_payload() {
        let mut client = client_with(vec![Ok(reply_frame(0x15, 0x64, 0x10, &[0x01, 0x02, 0x03]))]);

        let payload = client.configuration(0x15, &[0x01]).await.unwrap();

        assert_eq!(payload, vec![0x01, 0x02, 0x03]);
    }

    #[tokio::test]
    async fn test_error_reply_with_success_ack_is_not_accepted() {
        let mut client = client_with(vec![Ok(reply_frame(0x15, 0xC1, 0x10, &[]))]);

        let err = assert_err!(client.go(0x15).await);

        assert_eq!(
            err,
            VgreenError::MessageError {
                function: 0x41,
                ack: 0x10
            }
        );
        assert_eq!(client.transport().written.len(), 1);
    }

    #[tokio::test]
    async fn test_error_reply_surfaces_nack() {
        let mut client = client_with(vec![Ok(reply_frame(0x15, 0xC6, 0x01, &[]))]);

        let err = client.read_identification(0x15, &[]).await.unwrap_err();

        assert_eq!(
            err,
            VgreenError::Nack {
                function: 0x46,
                code: NackCode::from_u8(0x01).unwrap()
            }
        );
    }

    #[tokio::test]
    async fn test_close() {
        let mut client = client_with(vec![]);
        assert!(client.is_connected());
        client.close().await.unwrap();
        assert!(!client.is_connected());
    }
}
