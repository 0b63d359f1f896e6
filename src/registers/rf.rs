//! RF front-end registers
//!
//! This module contains registers related to the transmit power path and the
//! receiver signal strength:
//! - Power amplifier selection and output level
//! - Over-current protection
//! - High power PA test registers
//! - RSSI measurement
//!
//! # Power amplifier paths
//! - PA0 alone: -18 to +13 dBm, the only path on RFM69W/CW
//! - PA1 + PA2: up to +17 dBm on RFM69HW/HCW
//! - PA1 + PA2 with the boost test registers: up to +20 dBm. The boost must
//!   only be active while transmitting and over-current protection must be
//!   off while it is.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// PA selection and output power register (address: 0x11)
#[register(0x11u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PaLevel {
    /// Enable PA0 (RFO pin)
    pub pa0: bool,
    /// Enable PA1 (PA_BOOST pin)
    pub pa1: bool,
    /// Enable PA2 (PA_BOOST pin)
    pub pa2: bool,
    /// Output power setting, 0..=31
    pub output_power: u8,
}

impl PaLevel {
    pub const PA0_ON: u8 = 0x80;
    pub const PA1_ON: u8 = 0x40;
    pub const PA2_ON: u8 = 0x20;
    /// Mask of the output power field
    pub const OUTPUT_POWER_MASK: u8 = 0x1F;
    /// Highest output power setting
    pub const MAX_OUTPUT_POWER: u8 = 31;
}

impl Default for PaLevel {
    fn default() -> Self {
        Self {
            pa0: true,
            pa1: false,
            pa2: false,
            output_power: PaLevel::MAX_OUTPUT_POWER,
        }
    }
}

/// Over-current protection register (address: 0x13)
///
/// Must be disabled while the high power boost is in use.
#[register(0x13u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ocp {
    /// Over-current protection enabled
    pub enabled: bool,
    /// Current limit trim, Imax = 45 + 5 * trim mA
    pub trim: u8,
}

impl Ocp {
    /// Protection off, as required by the high power path
    pub const OFF: Self = Self {
        enabled: false,
        trim: 0x0F,
    };
}

impl Default for Ocp {
    /// Protection on with the 95 mA limit
    fn default() -> Self {
        Self {
            enabled: true,
            trim: 0x0A,
        }
    }
}

/// High power PA test register 1 (address: 0x5A)
#[register(0x5Au8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TestPa1 {
    /// +20 dBm boost (0x5D) instead of normal operation (0x55)
    pub boost: bool,
}

/// High power PA test register 2 (address: 0x5C)
#[register(0x5Cu8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TestPa2 {
    /// +20 dBm boost (0x7C) instead of normal operation (0x70)
    pub boost: bool,
}

/// RSSI control register (address: 0x23)
#[register(0x23u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RssiConfig {
    /// Trigger an RSSI measurement (write only)
    pub start: bool,
    /// Measurement finished (read only)
    pub done: bool,
}

/// RSSI value register (address: 0x24)
#[register(0x24u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RssiValue {
    /// Absolute signal strength in half dB steps
    pub raw: u8,
}

impl RssiValue {
    /// Signal strength in dBm
    pub fn dbm(&self) -> i16 {
        -(self.raw as i16) / 2
    }
}

impl FromByteArray for PaLevel {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            pa0: bytes[0] & Self::PA0_ON != 0,
            pa1: bytes[0] & Self::PA1_ON != 0,
            pa2: bytes[0] & Self::PA2_ON != 0,
            output_power: bytes[0] & Self::OUTPUT_POWER_MASK,
        })
    }
}

impl ToByteArray for PaLevel {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut value = self.output_power & Self::OUTPUT_POWER_MASK;
        if self.pa0 {
            value |= Self::PA0_ON;
        }
        if self.pa1 {
            value |= Self::PA1_ON;
        }
        if self.pa2 {
            value |= Self::PA2_ON;
        }
        Ok([value])
    }
}

impl ToByteArray for Ocp {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.enabled as u8) << 4) | (self.trim & 0x0F)])
    }
}

impl ToByteArray for TestPa1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([if self.boost { 0x5D } else { 0x55 }])
    }
}

impl ToByteArray for TestPa2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([if self.boost { 0x7C } else { 0x70 }])
    }
}

impl FromByteArray for RssiConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            start: false,
            done: bytes[0] & 0x02 != 0,
        })
    }
}

impl ToByteArray for RssiConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.start as u8])
    }
}

impl FromByteArray for RssiValue {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes[0] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocp_values() {
        assert_eq!(Ocp::OFF.to_bytes(), Ok([0x0F]));
        assert_eq!(Ocp::default().to_bytes(), Ok([0x1A]));
    }

    #[test]
    fn pa_level_bits() {
        let level = PaLevel {
            pa0: true,
            pa1: false,
            pa2: false,
            output_power: 31,
        };
        assert_eq!(level.to_bytes(), Ok([0x9F]));

        let level = PaLevel::from_bytes([0x7F]).unwrap();
        assert!(!level.pa0 && level.pa1 && level.pa2);
        assert_eq!(level.output_power, 31);
    }

    #[test]
    fn rssi_in_dbm() {
        assert_eq!(RssiValue { raw: 0xB4 }.dbm(), -90);
        assert_eq!(RssiValue { raw: 0 }.dbm(), 0);
    }
}
