//! VGreen Modbus Demo
//!
//! Demonstrates the vgreen_modbus library features:
//! - Encoding commands and decoding replies (no hardware needed)
//! - NACK and sensor fault reporting
//! - The async client, against a simulated motor or a real serial port
//!
//! Usage: cargo run --bin demo [serial_port]
//! Example: cargo run --features rtu --bin demo /dev/ttyUSB0

use std::future::Future;
use std::time::Duration;

use vgreen_modbus::transport::format_hex_frame;
use vgreen_modbus::{
    catalog, crc, decode, encode, AckStatus, BusConfig, TransportStats, VgreenClient,
    VgreenError, VgreenResult, VgreenTransport, DEFAULT_ADDRESS,
};

/// In-process motor answering every command with an accepted reply.
struct SimulatedMotor {
    address: u8,
    running: bool,
    demand: u16,
    pending: Option<Vec<u8>>,
    stats: TransportStats,
}

impl SimulatedMotor {
    fn new(address: u8) -> Self {
        Self {
            address,
            running: false,
            demand: 0,
            pending: None,
            stats: TransportStats::default(),
        }
    }

    fn respond(&mut self, command: &[u8]) -> Option<Vec<u8>> {
        let message = decode(command, self.address, command.get(1).copied()?).ok()?;
        let data = match message.function() {
            0x41 => {
                self.running = true;
                vec![]
            }
            0x42 => {
                self.running = false;
                vec![]
            }
            0x43 => vec![u8::from(self.running)],
            0x44 => {
                let d = message.data();
                self.demand = u16::from_le_bytes([d[1], d[2]]);
                d.to_vec()
            }
            0x45 => {
                let [lo, hi] = self.demand.to_le_bytes();
                vec![message.data()[0], message.data()[1], lo, hi]
            }
            0x46 => b"VG1".to_vec(),
            _ => vec![],
        };

        let mut reply = vec![self.address, message.function(), 0x10];
        reply.extend_from_slice(&data);
        reply.extend_from_slice(&crc::compute_bytes(&reply));
        Some(reply)
    }
}

impl VgreenTransport for SimulatedMotor {
    fn write_frame(&mut self, frame: &[u8]) -> impl Future<Output = VgreenResult<()>> + Send {
        self.stats.record_sent(frame.len());
        self.pending = self.respond(frame);
        async { Ok(()) }
    }

    fn read_frame(&mut self, timeout: Duration) -> impl Future<Output = VgreenResult<Vec<u8>>> + Send {
        let reply = match self.pending.take() {
            Some(reply) => {
                self.stats.record_received(reply.len());
                Ok(reply)
            }
            None => {
                self.stats.record_timeout();
                Err(VgreenError::timeout("read reply", timeout.as_millis() as u64))
            }
        };
        async move { reply }
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn close(&mut self) -> impl Future<Output = VgreenResult<()>> + Send {
        async { Ok(()) }
    }

    fn get_stats(&self) -> TransportStats {
        self.stats.clone()
    }
}

async fn drive<T: VgreenTransport>(client: &mut VgreenClient<T>) -> VgreenResult<()> {
    let (mode, demand) = client.set_demand(DEFAULT_ADDRESS, 0x00, 1000).await?;
    println!("  Set Demand echo: mode={} demand={}", mode, demand);

    client.go(DEFAULT_ADDRESS).await?;
    println!("  Go accepted");

    let status = client.status(DEFAULT_ADDRESS).await?;
    println!("  Status: 0x{:02X}", status);

    let reading = client.read_sensor(DEFAULT_ADDRESS, 0x00, 0x01).await?;
    println!("  Sensor {}/{} value: {}", reading.page, reading.sensor, reading.value);

    // The fault byte only carries a fault code on the fault-reporting sensor
    match reading.fault() {
        Ok(Some(fault)) => println!("    as fault byte: {}", fault),
        Ok(None) => println!("    as fault byte: no fault"),
        Err(e) => println!("    as fault byte: {}", e),
    }

    client.stop(DEFAULT_ADDRESS).await?;
    println!("  Stop accepted");

    let stats = client.get_stats();
    println!(
        "  Stats: {} frames sent, {} received, {} errors",
        stats.frames_sent, stats.frames_received, stats.errors
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("VGreen Modbus v{} Demo", vgreen_modbus::VERSION);
    println!("=========================\n");

    // =========================================================================
    // Part 1: Function catalog
    // =========================================================================
    println!("Part 1: Function Catalog");
    println!("------------------------");
    for descriptor in catalog::all() {
        let command = descriptor
            .command_length
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  0x{:02X} {:<26} command={:<4} reply={}",
            descriptor.code, descriptor.name, command, descriptor.reply_length
        );
    }

    // =========================================================================
    // Part 2: Encoding commands
    // =========================================================================
    println!("\nPart 2: Encoding Commands");
    println!("-------------------------");
    let commands: [(&str, u8, &[u8]); 4] = [
        ("Go", 0x41, &[]),
        ("Status", 0x43, &[]),
        ("Set Demand 1000", 0x44, &[0x00, 0xE8, 0x03]),
        ("Read Sensor 0/1", 0x45, &[0x00, 0x01]),
    ];
    for (name, function, data) in commands {
        let frame = encode(DEFAULT_ADDRESS, function, data)?;
        println!("  {:<16} {}", name, format_hex_frame(&frame));
    }

    match encode(0x16, 0x41, &[]) {
        Ok(_) => println!("  unexpected: even address accepted"),
        Err(e) => println!("  Address 0x16 rejected: {}", e),
    }

    // =========================================================================
    // Part 3: Decoding replies
    // =========================================================================
    println!("\nPart 3: Decoding Replies");
    println!("------------------------");
    let replies: [(&str, Vec<u8>, u8); 3] = [
        ("Status reply", vec![0x15, 0x43, 0x10, 0x00, 0xF8, 0x3C], 0x43),
        ("Go NACK (fault mode)", reply_with_crc(&[0x15, 0x41, 0x04]), 0x41),
        ("Corrupted Go reply", vec![0x15, 0x41, 0x10, 0x00, 0x00], 0x41),
    ];
    for (name, raw, function) in replies {
        match decode(&raw, DEFAULT_ADDRESS, function) {
            Ok(message) => {
                println!("  {}: {}", name, message);
                match message.classify()? {
                    AckStatus::Nack(code) => println!("    NACK: {}", code),
                    status => println!("    {:?}", status),
                }
            }
            Err(e) => println!("  {}: {}", name, e),
        }
    }

    // =========================================================================
    // Part 4: Client
    // =========================================================================
    println!("\nPart 4: Client");
    println!("--------------");
    let port = std::env::args().nth(1);

    match port {
        #[cfg(feature = "rtu")]
        Some(port) => {
            println!("  Using serial port {}", port);
            let transport = vgreen_modbus::RtuTransport::new(&port, 9600)?;
            let mut client = VgreenClient::with_config(transport, BusConfig::conservative());
            drive(&mut client).await?;
            client.close().await?;
        }
        #[cfg(not(feature = "rtu"))]
        Some(port) => {
            println!("  Serial port {} ignored: build with --features rtu", port);
        }
        None => {
            println!("  Using a simulated motor at 0x{:02X}", DEFAULT_ADDRESS);
            let motor = SimulatedMotor::new(DEFAULT_ADDRESS);
            let mut client = VgreenClient::with_config(motor, BusConfig::default());
            drive(&mut client).await?;
        }
    }

    println!("\nDemo completed");
    Ok(())
}

fn reply_with_crc(body: &[u8]) -> Vec<u8> {
    let mut frame = body.to_vec();
    frame.extend_from_slice(&crc::compute_bytes(body));
    frame
}
