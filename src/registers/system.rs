//! Operating mode and chip status registers
//!
//! This module contains:
//! - The operating mode register and the five chip modes
//! - The silicon version register
//! - The on-chip temperature sensor
//!
//! Mode changes are not instantaneous: after the mode bits are written the
//! chip raises `MODE_READY` in [`IrqFlags1`](super::IrqFlags1) once the new
//! mode is usable.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Error type for opmode bits that do not name a chip mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidMode(pub u8);

/// Operating mode of the transceiver
///
/// Discriminants are the mode bits (4:2) of the opmode register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Sleep: everything off, lowest current
    Sleep = 0x00,
    /// Standby: crystal oscillator running, FIFO accessible
    Standby = 0x04,
    /// Frequency synthesizer running
    FrequencySynthesis = 0x08,
    /// Transmitting
    Transmit = 0x0C,
    /// Receiving
    Receive = 0x10,
}

impl Mode {
    /// Opmode register bits selecting this mode
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Mode {
    type Error = InvalidMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Sleep),
            0x04 => Ok(Self::Standby),
            0x08 => Ok(Self::FrequencySynthesis),
            0x0C => Ok(Self::Transmit),
            0x10 => Ok(Self::Receive),
            invalid => Err(InvalidMode(invalid)),
        }
    }
}

/// Operating mode register (address: 0x01)
///
/// # Bit layout
/// - Bit 7: sequencer off
/// - Bit 6: listen mode on
/// - Bit 5: listen abort (write only)
/// - Bits 4:2: mode
///
/// The driver only ever replaces the mode bits, preserving the others
/// (mask `0xE3`).
#[register(0x01u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OpMode {
    /// Automatic sequencer disabled
    pub sequencer_off: bool,
    /// Listen mode enabled
    pub listen_on: bool,
    /// Current mode
    pub mode: Mode,
}

impl OpMode {
    /// Bits outside the mode field
    pub const PRESERVE_MASK: u8 = 0xE3;
}

/// Silicon version register (address: 0x10)
///
/// Reads 0x24 on production RFM69 / SX1231H parts.
#[register(0x10u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Version {
    /// Full revision number (bits 7:4) and metal mask revision (bits 3:0)
    pub revision: u8,
}

/// Temperature sensor control register (address: 0x4E)
///
/// Measurement only works in Standby or FrequencySynthesis.
#[register(0x4Eu8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temp1 {
    /// Trigger a measurement (write only)
    pub start: bool,
    /// Measurement in progress (read only)
    pub running: bool,
}

/// Temperature sensor value register (address: 0x4F)
#[register(0x4Fu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temp2 {
    /// Raw reading, inversely proportional to temperature
    pub raw: u8,
}

impl Temp2 {
    /// Uncalibrated temperature in degrees Celsius
    pub fn celsius(&self) -> i16 {
        166 - self.raw as i16
    }
}

impl FromByteArray for OpMode {
    type Error = InvalidMode;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            sequencer_off: bytes[0] & 0x80 != 0,
            listen_on: bytes[0] & 0x40 != 0,
            mode: Mode::try_from(bytes[0] & 0x1C)?,
        })
    }
}

impl FromByteArray for Version {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { revision: bytes[0] })
    }
}

impl FromByteArray for Temp1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            start: false,
            running: bytes[0] & 0x04 != 0,
        })
    }
}

impl ToByteArray for Temp1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.start as u8) << 3])
    }
}

impl FromByteArray for Temp2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes[0] })
    }
}
