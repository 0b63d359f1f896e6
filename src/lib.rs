#![cfg_attr(not(test), no_std)]
//! RFM69 Packet Radio Driver
//!
//! This crate drives the HopeRF RFM69 modules and the Semtech SX1231 family
//! of sub-GHz FSK transceivers, and runs a small addressed link layer on top
//! of them.
//!
//! # Features
//! - Bands: 315, 433, 868 and 915 MHz, or any carrier by frequency
//! - FSK at 55.5 kbps with 50 kHz deviation, variable length packets with CRC
//! - Output power:
//!   - RFM69W/CW: PA0, up to +13 dBm
//!   - RFM69HW/HCW: PA1 + PA2 with boost, up to +20 dBm
//! - Addressed frames with acknowledgment request and reply
//! - Listen-before-talk collision avoidance and send-with-retry
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`device`]: Register interface over SPI
//!   - Raw and typed register access, read-modify-write, FIFO bursts
//!   - Blocking and async variants
//!
//! - [`registers`]: Address map and typed views of the interpreted registers
//!
//! - [`config`]: Frequency bands, the register profile and driver settings
//!
//! - [`frame`]: Link-layer frame format
//!
//! - [`radio`]: The [`Radio`] driver
//!   - Mode state machine and power amplifier control
//!   - Send, acknowledge and receive protocol
//!
//! # Usage
//! Create a [`Radio`] from an SPI device and a delay provider, call
//! [`Radio::initialize`] once, then send frames or poll
//! [`Radio::receive_done`]:
//!
//! 1. Initialize with the band, own address and network id
//! 2. Call `receive_done` until it returns true
//! 3. Read the frame through [`Radio::data`] and [`Radio::session`]
//! 4. Answer with [`Radio::send_ack`] when [`Radio::ack_requested`]
//!
//! # Important Notes
//! - Every operation blocks until the chip reports completion; set
//!   [`Config::wait_timeout_ms`] to bound those waits
//! - Leave [`Config::high_power`] on only for HW/HCW modules
//! - Frames are never encrypted
//!
//! # Example
//! ```no_run
//! use embedded_hal::{delay::DelayNs, spi::SpiDevice};
//! use rfm69::{Config, Error, FrequencyBand, Radio};
//!
//! fn echo<SPI: SpiDevice, D: DelayNs>(spi: SPI, delay: D) -> Result<(), Error<SPI::Error>> {
//!     let mut radio = Radio::new(spi, delay, Config::default());
//!     radio.initialize(FrequencyBand::Mhz915, 1, 100)?;
//!
//!     loop {
//!         if radio.receive_done()? {
//!             if radio.ack_requested() {
//!                 radio.send_ack(&[])?;
//!             }
//!         }
//!     }
//! }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod radio;
pub mod registers;

pub use config::{Config, FrequencyBand};
pub use device::Device;
pub use error::Error;
pub use frame::{Control, Frame, FrameError};
pub use radio::{Radio, ReceiveSession};
pub use registers::{Mode, Register};
