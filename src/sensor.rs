//! Sensor fault codes and Read Sensor payloads
//!
//! A Read Sensor reply carries `[page, sensor, value lo, value hi]`. When the
//! motor has an active fault, the low value byte of its fault-reporting sensor
//! holds the fault code; 0x00 means no fault. Readings from other sensors carry
//! plain values in that byte and must not be resolved as faults. The fault
//! byte is independent of the ack byte: a reply with REPLY_ACK can still
//! report a fault.

use std::fmt;

use crate::error::{VgreenError, VgreenResult};

/// Offset of the fault byte inside a Read Sensor reply payload
pub const FAULT_BYTE_INDEX: usize = 2;

/// Fault byte value meaning "no active fault"
pub const NO_FAULT: u8 = 0x00;

/// Payload length of a Read Sensor reply (page, sensor, value lo, value hi)
pub const SENSOR_REPLY_DATA_LEN: usize = 4;

/// Device-level fault codes reported through Read Sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorFaultCode {
    SoftwareOvercurrent = 0x21,
    DcOvervoltage = 0x22,
    DcUndervoltage = 0x23,
    HardwareOvercurrent = 0x26,
    StartupFailure = 0x2A,
    ProcessorFatal = 0x2D,
    IgbtOverTemperature = 0x2E,
    LossOfPhase = 0x2F,
    LowPower = 0x30,
    ProcessorRegisters = 0x31,
    ProcessorProgramCounter = 0x32,
    ProcessorInterrupt = 0x33,
    ProcessorClock = 0x34,
    ProcessorFlash = 0x35,
    RasFault = 0x36,
    ProcessorAdc = 0x37,
    KeypadFault = 0x3C,
    LvbDataFlashFault = 0x3D,
    CommLossFault = 0x3E,
    GenericFault = 0x3F,
    CoherenceFault = 0x40,
    UlFault = 0x41,
    SvrsFaultType1 = 0x42,
    SvrsFaultType2 = 0x43,
    SvrsFaultType13 = 0x44,
}

impl SensorFaultCode {
    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        use SensorFaultCode::*;
        let code = match value {
            0x21 => SoftwareOvercurrent,
            0x22 => DcOvervoltage,
            0x23 => DcUndervoltage,
            0x26 => HardwareOvercurrent,
            0x2A => StartupFailure,
            0x2D => ProcessorFatal,
            0x2E => IgbtOverTemperature,
            0x2F => LossOfPhase,
            0x30 => LowPower,
            0x31 => ProcessorRegisters,
            0x32 => ProcessorProgramCounter,
            0x33 => ProcessorInterrupt,
            0x34 => ProcessorClock,
            0x35 => ProcessorFlash,
            0x36 => RasFault,
            0x37 => ProcessorAdc,
            0x3C => KeypadFault,
            0x3D => LvbDataFlashFault,
            0x3E => CommLossFault,
            0x3F => GenericFault,
            0x40 => CoherenceFault,
            0x41 => UlFault,
            0x42 => SvrsFaultType1,
            0x43 => SvrsFaultType2,
            0x44 => SvrsFaultType13,
            _ => return None,
        };
        Some(code)
    }

    /// Convert to u8
    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Description as worded in the protocol document
    pub fn description(self) -> &'static str {
        use SensorFaultCode::*;
        match self {
            SoftwareOvercurrent => "Software Overcurrent",
            DcOvervoltage => "DC overvoltage",
            DcUndervoltage => "DC under voltage",
            HardwareOvercurrent => "Hardware overcurrent",
            StartupFailure => "Startup Failure",
            ProcessorFatal => "Processor – Fatal",
            IgbtOverTemperature => "IGBT over temperature",
            LossOfPhase => "Loss of phase",
            LowPower => "Low Power",
            ProcessorRegisters => "Processor - Registers",
            ProcessorProgramCounter => "Processor - Program counter",
            ProcessorInterrupt => "Processor - Interrupt/Execution",
            ProcessorClock => "Processor - Clock",
            ProcessorFlash => "Processor - Flash memory",
            RasFault => "Ras Fault",
            ProcessorAdc => "Processor - ADC",
            KeypadFault => "Keypad Fault",
            LvbDataFlashFault => "LVB Data Flash Fault",
            CommLossFault => "Comm Loss Fault- LVB & Drive",
            GenericFault => "Generic Fault; any other code not listed",
            CoherenceFault => "Coherence Fault",
            UlFault => "UL Fault",
            SvrsFaultType1 => "SVRS Fault Type 1",
            SvrsFaultType2 => "SVRS Fault Type 2",
            SvrsFaultType13 => "SVRS Fault Type 13",
        }
    }
}

impl fmt::Display for SensorFaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.description(), self.to_u8())
    }
}

/// Resolve a fault byte.
///
/// Returns `Ok(None)` for [`NO_FAULT`] and fails with `UnknownSensorFault`
/// for a byte missing from the table.
pub fn resolve_fault(byte: u8) -> VgreenResult<Option<SensorFaultCode>> {
    if byte == NO_FAULT {
        return Ok(None);
    }
    SensorFaultCode::from_u8(byte)
        .map(Some)
        .ok_or(VgreenError::UnknownSensorFault { code: byte })
}

/// Decoded Read Sensor reply payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    /// Sensor page echoed from the command
    pub page: u8,
    /// Sensor address echoed from the command
    pub sensor: u8,
    /// Raw sensor value, sent low byte first
    pub value: u16,
}

impl SensorReading {
    /// Parse a 4-byte Read Sensor reply payload
    pub fn from_payload(data: &[u8]) -> Option<Self> {
        match data {
            [page, sensor, lo, hi] => Some(Self {
                page: *page,
                sensor: *sensor,
                value: u16::from_le_bytes([*lo, *hi]),
            }),
            _ => None,
        }
    }

    /// Fault carried in the payload's fault byte.
    ///
    /// The fault byte shares its position with the low value byte, so this is
    /// only meaningful for a reading taken from the sensor the motor reports
    /// faults on. On any other sensor an ordinary value (e.g. 1000, low byte
    /// 0xE8) reads as `UnknownSensorFault`; use [`SensorReading::value`] there.
    pub fn fault(&self) -> VgreenResult<Option<SensorFaultCode>> {
        resolve_fault(self.value.to_le_bytes()[0])
    }
}
