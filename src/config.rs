//! Radio configuration
//!
//! Two kinds of configuration live here:
//! - The chip profile: an ordered table of register writes that takes the
//!   RFM69 from its power-on defaults to the link-layer operating profile
//!   (FSK packet mode, 55.5 kbps, 50 kHz deviation, variable length frames
//!   with CRC, sync word carrying the network id).
//! - [`Config`], the driver's own runtime settings (timeouts, power path,
//!   address filtering).
//!
//! # Important Notes
//! - Table order matters: the FIFO is flushed (FIFO overrun write) before the
//!   packet format registers are set
//! - The first table entry puts the chip in Standby with the sequencer on
//! - A failed initialization is not rolled back

use crate::registers::{Register, SYNC_WORD_PREFIX};

/// Crystal oscillator frequency in Hz
pub const FXOSC_HZ: u64 = 32_000_000;

/// Carrier frequency bands with a fixed FRF setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrequencyBand {
    Mhz315,
    Mhz433,
    Mhz868,
    Mhz915,
}

impl FrequencyBand {
    /// FRF register triplet (MSB, MID, LSB) for the band
    pub const fn frf(self) -> [u8; 3] {
        match self {
            Self::Mhz315 => [0x4E, 0xC0, 0x00],
            Self::Mhz433 => [0x6C, 0x40, 0x00],
            Self::Mhz868 => [0xD9, 0x00, 0x00],
            Self::Mhz915 => [0xE4, 0xC0, 0x00],
        }
    }

    /// Carrier frequency in Hz
    pub const fn frequency_hz(self) -> u32 {
        match self {
            Self::Mhz315 => 315_000_000,
            Self::Mhz433 => 433_000_000,
            Self::Mhz868 => 868_000_000,
            Self::Mhz915 => 915_000_000,
        }
    }
}

/// FRF register triplet for an arbitrary carrier frequency.
///
/// FRF = f / Fstep with Fstep = FXOSC / 2^19 (about 61 Hz).
pub const fn frf_for_frequency(frequency_hz: u32) -> [u8; 3] {
    let frf = ((frequency_hz as u64) << 19) / FXOSC_HZ;
    [(frf >> 16) as u8, (frf >> 8) as u8, frf as u8]
}

/// A single register write of the chip profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigEntry {
    pub register: Register,
    pub value: u8,
}

impl ConfigEntry {
    const fn new(register: Register, value: u8) -> Self {
        Self { register, value }
    }
}

/// Number of entries in the chip profile
pub const CONFIG_TABLE_LEN: usize = 22;

/// RSSI threshold register value, -110 dBm
const RSSI_THRESHOLD: u8 = 220;

/// Payload length limit in variable length mode (the whole FIFO)
const MAX_RX_LENGTH: u8 = 66;

/// Builds the chip profile for a band and network id.
///
/// Entries must be written in the returned order.
pub const fn config_table(band: FrequencyBand, network_id: u8) -> [ConfigEntry; CONFIG_TABLE_LEN] {
    let frf = band.frf();
    [
        // Sequencer on, listen off, standby
        ConfigEntry::new(Register::OpMode, 0x04),
        // Packet mode, FSK, no shaping
        ConfigEntry::new(Register::DataModul, 0x00),
        // 55.5 kbps
        ConfigEntry::new(Register::BitrateMsb, 0x02),
        ConfigEntry::new(Register::BitrateLsb, 0x40),
        // 50 kHz deviation
        ConfigEntry::new(Register::FdevMsb, 0x03),
        ConfigEntry::new(Register::FdevLsb, 0x33),
        ConfigEntry::new(Register::FrfMsb, frf[0]),
        ConfigEntry::new(Register::FrfMid, frf[1]),
        ConfigEntry::new(Register::FrfLsb, frf[2]),
        // DCC 4%, RxBw 125 kHz (BitRate < 2 * RxBw)
        ConfigEntry::new(Register::RxBw, 0x42),
        // DIO0 on payload ready
        ConfigEntry::new(Register::DioMapping1, 0x40),
        // ClkOut off
        ConfigEntry::new(Register::DioMapping2, 0x07),
        // Flush the FIFO and reset the FIFO flags
        ConfigEntry::new(Register::IrqFlags2, 0x10),
        ConfigEntry::new(Register::RssiThresh, RSSI_THRESHOLD),
        // Sync on, FIFO fill on sync address, 2 sync bytes, no tolerance
        ConfigEntry::new(Register::SyncConfig, 0x88),
        ConfigEntry::new(Register::SyncValue1, SYNC_WORD_PREFIX),
        ConfigEntry::new(Register::SyncValue2, network_id),
        // Variable length, DC free off, CRC on, CRC auto clear on, no address filtering
        ConfigEntry::new(Register::PacketConfig1, 0x90),
        ConfigEntry::new(Register::PayloadLength, MAX_RX_LENGTH),
        // TX start on FIFO not empty, threshold 15
        ConfigEntry::new(Register::FifoThresh, 0x8F),
        // RX restart delay 2 bits, auto RX restart on, AES off
        ConfigEntry::new(Register::PacketConfig2, 0x12),
        // Continuous DAGC, improved margin for AfcLowBetaOn = 0
        ConfigEntry::new(Register::TestDagc, 0x30),
    ]
}

/// Runtime settings of the driver
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Use the PA1 + PA2 high power path (RFM69HW/HCW). Enables the +20 dBm
    /// boost while transmitting.
    pub high_power: bool,
    /// Accept frames addressed to any node.
    pub promiscuous: bool,
    /// Delay between two reads of a status register while waiting.
    pub poll_interval_us: u32,
    /// How long `send` waits for a clear channel before transmitting anyway.
    pub csma_timeout_ms: u32,
    /// Treat the channel as busy while the RSSI is at or above this level
    /// (dBm). `None` only looks at frame reception.
    pub csma_rssi_limit: Option<i16>,
    /// Bound for hardware waits (mode ready, packet sent, RSSI and
    /// temperature measurements). `None` waits forever.
    pub wait_timeout_ms: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            high_power: true,
            promiscuous: false,
            poll_interval_us: 100,
            csma_timeout_ms: 1000,
            csma_rssi_limit: None,
            wait_timeout_ms: None,
        }
    }
}
