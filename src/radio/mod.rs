//! Blocking RFM69 radio driver
//!
//! [`Radio`] owns the register interface, a delay provider and the driver
//! state. It is split over three modules:
//! - [`mode`]: the chip mode state machine and the power amplifier
//! - [`packet`]: frame transmission, acknowledgments and reception
//! - [`session`]: the state of the frame currently held
//!
//! This module holds construction, initialization and the chip level
//! utilities (RSSI, temperature, frequency, presence check).
//!
//! # Example
//! ```no_run
//! use embedded_hal::{delay::DelayNs, spi::SpiDevice};
//! use rfm69::{Config, Error, FrequencyBand, Radio};
//!
//! fn ping<SPI: SpiDevice, D: DelayNs>(spi: SPI, delay: D) -> Result<bool, Error<SPI::Error>> {
//!     let mut radio = Radio::new(spi, delay, Config::default());
//!     radio.initialize(FrequencyBand::Mhz868, 2, 100)?;
//!     radio.send_with_retry(1, b"ping", 3, 40)
//! }
//! ```

mod mode;
mod packet;
mod session;

#[cfg(test)]
mod mock;

pub use session::ReceiveSession;

use embedded_hal::delay::DelayNs;

use crate::config::{config_table, frf_for_frequency, Config, FrequencyBand};
use crate::registers::{
    Irq2, IrqFlags2, Mode, PaLevel, RssiConfig, RssiValue, Temp1, Temp2, Version,
    PACKET2_AES_MASK, SYNC_WORD_PREFIX,
};
use crate::{Device, Error, Register};

/// Time allowed for each pattern of the presence check
const PROBE_TIMEOUT_MS: u32 = 50;

/// RFM69 packet radio.
///
/// Every operation is a blocking sequence of SPI transactions. Waits for
/// the hardware poll a status register, sleeping
/// [`Config::poll_interval_us`] between reads.
pub struct Radio<SPI, D> {
    device: Device<SPI>,
    delay: D,
    config: Config,
    mode: Mode,
    mode_ready: bool,
    address: u8,
    network_id: u8,
    band: Option<FrequencyBand>,
    power_level: u8,
    high_power: bool,
    session: ReceiveSession,
}

impl<SPI, D> Radio<SPI, D> {
    /// Creates a driver. No bus traffic happens until
    /// [`initialize`](Radio::initialize).
    pub fn new(spi: SPI, delay: D, config: Config) -> Self {
        Self {
            device: Device::new(spi),
            delay,
            config,
            mode: Mode::Standby,
            mode_ready: true,
            address: 0,
            network_id: 0,
            band: None,
            power_level: PaLevel::MAX_OUTPUT_POWER,
            high_power: false,
            session: ReceiveSession::default(),
        }
    }

    /// Releases the SPI device and the delay provider.
    pub fn release(self) -> (SPI, D) {
        (self.device.release(), self.delay)
    }

    /// Mode the driver last put the chip in
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the chip reported the recorded mode ready. False after a
    /// transition that failed or timed out.
    pub fn is_mode_ready(&self) -> bool {
        self.mode_ready
    }

    /// Recorded mode is `mode` and the chip confirmed it
    pub(crate) fn in_mode(&self, mode: Mode) -> bool {
        self.mode_ready && self.mode == mode
    }

    /// Own node address
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn network_id(&self) -> u8 {
        self.network_id
    }

    /// Band selected at initialization, `None` after tuning to a frequency
    /// outside the fixed bands
    pub fn band(&self) -> Option<FrequencyBand> {
        self.band
    }

    pub fn power_level(&self) -> u8 {
        self.power_level
    }

    /// Whether the PA1 + PA2 high power path is selected
    pub fn is_high_power(&self) -> bool {
        self.high_power
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// State of the last receive attempt
    pub fn session(&self) -> &ReceiveSession {
        &self.session
    }

    /// Payload of the last received frame
    pub fn data(&self) -> &[u8] {
        self.session.data()
    }

    /// Own address used for the sender field and for receive filtering.
    ///
    /// Filtering happens in the driver, the chip's address filter stays off.
    pub fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    /// Accept frames addressed to other nodes.
    pub fn set_promiscuous(&mut self, on: bool) {
        self.config.promiscuous = on;
    }
}

impl<SPI, D> Radio<SPI, D>
where
    SPI: embedded_hal::spi::SpiDevice,
    D: DelayNs,
{
    /// Brings the chip from any state into the packet profile and Standby.
    ///
    /// # Arguments
    /// * `band` - Carrier frequency band
    /// * `node_id` - Own address
    /// * `network_id` - Second sync word byte, separating networks
    ///
    /// # Errors
    /// * `Error::Config` - A register write failed. The chip is left partially
    ///   configured and `initialize` must be called again.
    /// * `Error::Timeout` - The chip never reported the Standby mode ready
    pub fn initialize(
        &mut self,
        band: FrequencyBand,
        node_id: u8,
        network_id: u8,
    ) -> Result<(), Error<SPI::Error>> {
        self.configure(band, node_id, network_id)
            .map_err(Error::into_config)
    }

    fn configure(
        &mut self,
        band: FrequencyBand,
        node_id: u8,
        network_id: u8,
    ) -> Result<(), Error<SPI::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Writing configuration for {}", band);

        for entry in config_table(band, network_id) {
            self.device.write(entry.register, entry.value)?;
        }

        // The first table entry selects Standby
        self.mode = Mode::Standby;
        self.mode_ready = true;
        self.band = Some(band);
        self.address = node_id;
        self.network_id = network_id;

        self.disable_encryption()?;
        self.set_high_power(self.config.high_power)?;
        self.apply_mode(Mode::Standby)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Radio initialized, node {} on network {}", node_id, network_id);

        Ok(())
    }

    /// Turns AES off. Frames always go out in the clear.
    fn disable_encryption(&mut self) -> Result<(), Error<SPI::Error>> {
        self.set_mode(Mode::Standby)?;
        self.device
            .conditional_set(Register::PacketConfig2, PACKET2_AES_MASK, 0)
    }

    /// Polls `ready` until it returns true.
    ///
    /// Returns `Ok(false)` once `timeout_ms` has elapsed; `None` polls
    /// forever. Errors from `ready` abort the wait.
    pub(crate) fn poll_until<F>(
        &mut self,
        timeout_ms: Option<u32>,
        mut ready: F,
    ) -> Result<bool, Error<SPI::Error>>
    where
        F: FnMut(&mut Self) -> Result<bool, Error<SPI::Error>>,
    {
        let limit_us = timeout_ms.map(|ms| u64::from(ms) * 1000);
        let step = self.config.poll_interval_us.max(1);
        let mut elapsed_us = 0u64;

        loop {
            if ready(self)? {
                return Ok(true);
            }
            if limit_us.is_some_and(|limit| elapsed_us >= limit) {
                return Ok(false);
            }
            self.delay.delay_us(step);
            elapsed_us += u64::from(step);
        }
    }

    /// Waits on a hardware flag, bounded by [`Config::wait_timeout_ms`].
    pub(crate) fn wait_for<F>(&mut self, ready: F) -> Result<(), Error<SPI::Error>>
    where
        F: FnMut(&mut Self) -> Result<bool, Error<SPI::Error>>,
    {
        if self.poll_until(self.config.wait_timeout_ms, ready)? {
            Ok(())
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Hardware wait timed out");
            Err(Error::Timeout)
        }
    }

    /// Whether a frame is waiting in the FIFO
    pub(crate) fn payload_ready(&mut self) -> Result<bool, Error<SPI::Error>> {
        let irq = self.device.read_register::<IrqFlags2>()?;
        Ok(irq.flags.contains(Irq2::PAYLOAD_READY))
    }

    /// Signal strength in dBm.
    ///
    /// With `force_trigger` a new measurement is started and awaited first,
    /// otherwise the last value sampled by the receiver is returned.
    pub fn read_rssi(&mut self, force_trigger: bool) -> Result<i16, Error<SPI::Error>> {
        if force_trigger {
            self.device.write_register(RssiConfig {
                start: true,
                done: false,
            })?;
            self.wait_for(|radio| Ok(radio.device.read_register::<RssiConfig>()?.done))?;
        }
        Ok(self.device.read_register::<RssiValue>()?.dbm())
    }

    /// Die temperature in degrees Celsius, uncalibrated.
    ///
    /// The sensor only works in Standby, so the radio is left there.
    pub fn read_temperature(&mut self) -> Result<i16, Error<SPI::Error>> {
        self.set_mode(Mode::Standby)?;
        self.device.write_register(Temp1 {
            start: true,
            running: false,
        })?;
        self.wait_for(|radio| Ok(!radio.device.read_register::<Temp1>()?.running))?;
        Ok(self.device.read_register::<Temp2>()?.celsius())
    }

    /// Silicon revision, 0x24 on production parts
    pub fn version(&mut self) -> Result<u8, Error<SPI::Error>> {
        Ok(self.device.read_register::<Version>()?.revision)
    }

    /// Checks that a chip answers on the bus.
    ///
    /// Writes 0xAA then 0x55 to the first sync byte and reads each back,
    /// giving up on a pattern after 50 ms. The sync byte is restored
    /// afterwards.
    pub fn probe(&mut self) -> Result<bool, Error<SPI::Error>> {
        let found = self.device.write_and_poll_until(
            &mut self.delay,
            Register::SyncValue1,
            0xAA,
            0xAA,
            PROBE_TIMEOUT_MS,
        )? && self.device.write_and_poll_until(
            &mut self.delay,
            Register::SyncValue1,
            0x55,
            0x55,
            PROBE_TIMEOUT_MS,
        )?;

        self.device.write(Register::SyncValue1, SYNC_WORD_PREFIX)?;

        #[cfg(feature = "defmt")]
        if !found {
            defmt::warn!("No radio answered the sync register handshake");
        }

        Ok(found)
    }

    /// Tunes the carrier to `frequency_hz`.
    ///
    /// The synthesizer only relocks on a mode change, so a receiving radio
    /// passes through FrequencySynthesis; a transmitting one is moved to
    /// Receive first.
    pub fn set_frequency(&mut self, frequency_hz: u32) -> Result<(), Error<SPI::Error>> {
        let previous = self.mode;
        if previous == Mode::Transmit {
            self.set_mode(Mode::Receive)?;
        }

        let [msb, mid, lsb] = frf_for_frequency(frequency_hz);
        self.device.write(Register::FrfMsb, msb)?;
        self.device.write(Register::FrfMid, mid)?;
        self.device.write(Register::FrfLsb, lsb)?;

        if previous == Mode::Receive {
            self.set_mode(Mode::FrequencySynthesis)?;
        }
        self.set_mode(previous)?;

        self.band = [
            FrequencyBand::Mhz315,
            FrequencyBand::Mhz433,
            FrequencyBand::Mhz868,
            FrequencyBand::Mhz915,
        ]
        .into_iter()
        .find(|band| band.frequency_hz() == frequency_hz);

        Ok(())
    }

    /// Moves to another network by rewriting the second sync byte.
    pub fn set_network(&mut self, network_id: u8) -> Result<(), Error<SPI::Error>> {
        self.device.write(Register::SyncValue2, network_id)?;
        self.network_id = network_id;
        Ok(())
    }
}
